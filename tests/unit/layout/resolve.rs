use serde_json::json;

use super::*;
use crate::layout::parse::parse;

fn canvas() -> Bounds {
    Bounds::new(0.0, 0.0, 400.0, 200.0)
}

fn resolved(v: serde_json::Value) -> LayoutNode {
    let mut root = parse(v).unwrap().root;
    resolve(&mut root, canvas());
    root
}

#[test]
fn root_fills_the_canvas_and_children_default_to_content_box() {
    let root = resolved(json!({
        "type": "container",
        "props": { "padding": 10 },
        "children": [{ "type": "rect" }]
    }));
    assert_eq!(root.bounds, Some(canvas()));
    assert_eq!(
        root.children[0].bounds,
        Some(Bounds::new(10.0, 10.0, 380.0, 180.0))
    );
}

#[test]
fn free_children_use_offsets_and_percentages() {
    let root = resolved(json!({
        "type": "container",
        "children": [{ "type": "rect", "props": { "x": 20, "y": "10px", "width": "50%", "height": 40 } }]
    }));
    assert_eq!(
        root.children[0].bounds,
        Some(Bounds::new(20.0, 10.0, 200.0, 40.0))
    );
}

#[test]
fn free_child_without_size_fills_remaining_area() {
    let root = resolved(json!({
        "type": "container",
        "children": [{ "type": "rect", "props": { "x": 100, "y": 50 } }]
    }));
    assert_eq!(
        root.children[0].bounds,
        Some(Bounds::new(100.0, 50.0, 300.0, 150.0))
    );
}

#[test]
fn row_shares_leftover_space_between_auto_children() {
    let root = resolved(json!({
        "type": "row",
        "props": { "gap": 10 },
        "children": [
            { "type": "rect", "props": { "width": 100 } },
            { "type": "rect" },
            { "type": "rect" }
        ]
    }));
    let b: Vec<Bounds> = root.children.iter().map(|c| c.bounds.unwrap()).collect();
    assert_eq!(b[0], Bounds::new(0.0, 0.0, 100.0, 200.0));
    // 400 - 100 - 2 * 10 = 280, shared by two.
    assert_eq!(b[1], Bounds::new(110.0, 0.0, 140.0, 200.0));
    assert_eq!(b[2], Bounds::new(260.0, 0.0, 140.0, 200.0));
}

#[test]
fn column_direction_prop_and_cross_alignment() {
    let root = resolved(json!({
        "type": "container",
        "props": { "direction": "column", "align": "center", "padding": [0, 50] },
        "children": [
            { "type": "rect", "props": { "height": 50, "width": 100 } },
            { "type": "rect", "props": { "height": 50 } }
        ]
    }));
    let b: Vec<Bounds> = root.children.iter().map(|c| c.bounds.unwrap()).collect();
    assert_eq!(b[0], Bounds::new(150.0, 0.0, 100.0, 50.0));
    assert_eq!(b[1], Bounds::new(50.0, 50.0, 300.0, 50.0));
}

#[test]
fn end_alignment_in_a_row() {
    let root = resolved(json!({
        "type": "row",
        "props": { "align": "end" },
        "children": [{ "type": "rect", "props": { "width": 10, "height": 20 } }]
    }));
    assert_eq!(
        root.children[0].bounds,
        Some(Bounds::new(0.0, 180.0, 10.0, 20.0))
    );
}

#[test]
fn nested_bounds_are_absolute() {
    let root = resolved(json!({
        "type": "container",
        "props": { "padding": 20 },
        "children": [{
            "type": "container",
            "props": { "x": 10, "y": 10, "padding": 5 },
            "children": [{ "type": "rect", "props": { "x": 1, "y": 2, "width": 3, "height": 4 } }]
        }]
    }));
    let leaf = root.children[0].children[0].bounds.unwrap();
    assert_eq!(leaf, Bounds::new(36.0, 37.0, 3.0, 4.0));
}

#[test]
fn overflowing_flow_never_produces_negative_sizes() {
    let root = resolved(json!({
        "type": "row",
        "children": [{ "type": "rect", "props": { "width": 500 } }, { "type": "rect" }]
    }));
    assert_eq!(root.children[1].bounds.unwrap().width, 0.0);
}

#[test]
fn length_and_padding_forms() {
    assert_eq!(length(Some(&json!(12)), 100.0), Some(12.0));
    assert_eq!(length(Some(&json!("25%")), 200.0), Some(50.0));
    assert_eq!(length(Some(&json!(" 7px ")), 0.0), Some(7.0));
    assert_eq!(length(Some(&json!("wide")), 0.0), None);
    assert_eq!(length(None, 10.0), None);

    assert_eq!(padding(Some(&json!(4))), Insets::uniform(4.0));
    assert_eq!(
        padding(Some(&json!([1, 2, 3, 4]))),
        Insets { top: 1.0, right: 2.0, bottom: 3.0, left: 4.0 }
    );
    assert_eq!(
        padding(Some(&json!({ "left": 6 }))),
        Insets { left: 6.0, ..Insets::default() }
    );
    assert_eq!(padding(Some(&json!([1, 2, 3]))), Insets::default());
}
