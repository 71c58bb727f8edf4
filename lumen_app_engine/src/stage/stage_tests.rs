//! Unit tests for the Stage container

use crate::driver::mock_driver::MockDriver;
use crate::stage::{Control, Stage, WindowControl};

fn open_window(driver: &mut MockDriver) -> Control {
    Control::Window(WindowControl::open(driver, 640, 480).unwrap())
}

fn handles(stage: &Stage) -> Vec<u64> {
    stage
        .children()
        .iter()
        .map(|control| match control {
            Control::Window(window) => window.handle().as_raw(),
        })
        .collect()
}

#[test]
fn test_new_stage_is_empty() {
    let stage = Stage::new();
    assert!(stage.is_empty());
    assert_eq!(stage.len(), 0);
    assert!(stage.child(0).is_none());
}

#[test]
fn test_children_keep_insertion_order() {
    let mut driver = MockDriver::new();
    let mut stage = Stage::new();

    for _ in 0..4 {
        stage.add_child(open_window(&mut driver));
    }

    assert_eq!(stage.len(), 4);
    assert_eq!(handles(&stage), vec![1, 2, 3, 4]);
}

#[test]
fn test_remove_child_preserves_tail_order() {
    let mut driver = MockDriver::new();
    let mut stage = Stage::new();

    for _ in 0..4 {
        stage.add_child(open_window(&mut driver));
    }

    let removed = stage.remove_child(1);
    match removed {
        Control::Window(window) => assert_eq!(window.handle().as_raw(), 2),
    }

    assert_eq!(handles(&stage), vec![1, 3, 4]);
}

#[test]
fn test_removed_control_is_gone_for_good() {
    let mut driver = MockDriver::new();
    let mut stage = Stage::new();

    stage.add_child(open_window(&mut driver));
    let _removed = stage.remove_child(0);

    // Removal is by value; the stage holds nothing that could resurrect it
    assert!(stage.is_empty());
}

#[test]
fn test_child_mut_reaches_the_same_control() {
    let mut driver = MockDriver::new();
    let mut stage = Stage::new();
    stage.add_child(open_window(&mut driver));

    stage.child_mut(0).unwrap().deactivate();
    assert!(!stage.child(0).unwrap().is_active());
}
