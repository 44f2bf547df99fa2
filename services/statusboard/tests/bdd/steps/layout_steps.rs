//! BDD step definitions for board layout feature

use cucumber::{given, then, when};

use statusboard::render::{Layout, MonoFonts, Renderer};
use statusboard::snapshot::Snapshot;

use crate::steps::snapshot_steps::{sample_incidents, sample_ratios};
use crate::world::StatusBoardWorld;

#[given("no monitors are down")]
fn none_down(world: &mut StatusBoardWorld) {
    world.down_monitors.clear();
}

#[given(expr = "the monitors {string} are down")]
fn monitors_down(world: &mut StatusBoardWorld, names: String) {
    world.down_monitors = names.split(',').map(|s| s.trim().to_string()).collect();
}

#[when("the board is drawn")]
fn draw_board(world: &mut StatusBoardWorld) {
    let snapshot = Snapshot::new(
        sample_ratios(),
        world.down_monitors.clone(),
        sample_incidents(),
        Some(sample_incidents()),
    );
    let renderer = Renderer::new(Layout::default(), Box::new(MonoFonts::default()), 2);
    world.canvas = Some(renderer.draw(&snapshot));
}

#[then(expr = "the text {string} should not appear")]
fn text_absent(world: &mut StatusBoardWorld, text: String) {
    let canvas = world.canvas.as_ref().expect("board not drawn");
    assert!(canvas.find(&text).is_none(), "{:?} was drawn", text);
}

#[then(expr = "the text {string} should appear")]
fn text_present(world: &mut StatusBoardWorld, text: String) {
    let canvas = world.canvas.as_ref().expect("board not drawn");
    assert!(canvas.find(&text).is_some(), "{:?} was not drawn", text);
}

#[then(expr = "the {string} heading should start at the top of the right column")]
fn heading_at_top(world: &mut StatusBoardWorld, heading: String) {
    let canvas = world.canvas.as_ref().expect("board not drawn");
    let layout = Layout::default();
    let placed = canvas.find(&heading).expect("heading not drawn");
    assert_eq!(placed.position.x, layout.right_x);
    assert_eq!(placed.position.y, 0);
}

#[then(expr = "the {string} heading should appear above the {string} heading")]
fn heading_above(world: &mut StatusBoardWorld, upper: String, lower: String) {
    let canvas = world.canvas.as_ref().expect("board not drawn");
    let upper = canvas.find(&upper).expect("upper heading not drawn");
    let lower = canvas.find(&lower).expect("lower heading not drawn");
    assert_eq!(upper.position.x, lower.position.x);
    assert!(upper.position.y < lower.position.y);
}

#[then(expr = "the frame should be {int} by {int} pixels")]
fn frame_size(world: &mut StatusBoardWorld, width: u32, height: u32) {
    let canvas = world.canvas.as_ref().expect("board not drawn");
    assert_eq!(canvas.frame.width(), width);
    assert_eq!(canvas.frame.height(), height);
}
