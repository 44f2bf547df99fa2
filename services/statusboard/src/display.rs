//! Display driver boundary and the file-backed panel

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::DisplayConfig;
use crate::render::Frame;

/// Physical panel operations
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DisplayDriver: Send + Sync {
    /// Wake the panel and prepare it for frames
    async fn init(&self) -> crate::Result<()>;

    /// Blank the panel to white
    async fn clear(&self) -> crate::Result<()>;

    /// Push a full frame
    async fn display(&self, frame: &Frame) -> crate::Result<()>;

    /// Put the panel into low-power mode
    async fn sleep(&self) -> crate::Result<()>;
}

/// Panel that hands frames to an external pusher through files.
///
/// Each frame is written as a PBM image and, when configured, as the raw
/// device buffer. Files are replaced atomically so a reader never sees a
/// half-written frame.
#[derive(Debug)]
pub struct PbmFileDisplay {
    image_path: PathBuf,
    buffer_path: Option<PathBuf>,
    width: u32,
    height: u32,
}

impl PbmFileDisplay {
    pub fn new(config: &DisplayConfig, width: u32, height: u32) -> Self {
        tracing::debug!(
            "Created PbmFileDisplay {}x{} at {:?}",
            width,
            height,
            config.output_path
        );
        Self {
            image_path: config.output_path.clone(),
            buffer_path: config.device_buffer_path.clone(),
            width,
            height,
        }
    }

    async fn push(&self, frame: &Frame) -> crate::Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(crate::StatusBoardError::Device(format!(
                "frame is {}x{}, panel is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        write_atomic(&self.image_path, &frame.to_pbm()).await?;
        if let Some(buffer_path) = &self.buffer_path {
            write_atomic(buffer_path, &frame.to_device_buffer()).await?;
        }
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> crate::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| crate::StatusBoardError::Device(format!("writing {:?}: {}", tmp, e)))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            tracing::warn!("Failed to remove {:?}: {}", tmp, cleanup);
        }
        return Err(crate::StatusBoardError::Device(format!("replacing {:?}: {}", path, e)));
    }
    Ok(())
}

#[async_trait]
impl DisplayDriver for PbmFileDisplay {
    async fn init(&self) -> crate::Result<()> {
        let parents = std::iter::once(&self.image_path)
            .chain(self.buffer_path.iter())
            .filter_map(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty());
        for dir in parents {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                crate::StatusBoardError::Device(format!("creating {:?}: {}", dir, e))
            })?;
        }
        tracing::debug!("Display initialised");
        Ok(())
    }

    async fn clear(&self) -> crate::Result<()> {
        tracing::debug!("Clearing display");
        self.push(&Frame::new(self.width, self.height)).await
    }

    async fn display(&self, frame: &Frame) -> crate::Result<()> {
        self.push(frame).await?;
        tracing::debug!("Frame written to {:?}", self.image_path);
        Ok(())
    }

    async fn sleep(&self) -> crate::Result<()> {
        tracing::debug!("Display sleeping");
        Ok(())
    }
}
