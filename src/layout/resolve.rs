use serde_json::Value;

use crate::foundation::core::{Bounds, Insets};
use crate::layout::node::LayoutNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Align {
    Start,
    Center,
    End,
    Stretch,
}

/// Assign absolute bounds to `root` and every descendant.
///
/// Single top-down pass. The root is placed inside `container`; each child is placed inside its
/// parent's content box (bounds minus `padding`). Flow containers (`direction: "row" | "column"`,
/// or types `row` / `column`) stack their children along the main axis with `gap`, sharing leftover
/// space equally between children that do not size themselves on that axis. Other containers
/// position children by `x`/`y` and default them to fill the remaining content box.
#[tracing::instrument(skip_all, fields(w = container.width, h = container.height))]
pub fn resolve(root: &mut LayoutNode, container: Bounds) {
    let b = place_free(root, container);
    resolve_at(root, b);
}

fn resolve_at(node: &mut LayoutNode, bounds: Bounds) {
    node.bounds = Some(bounds);
    let content = bounds.inset(padding(node.prop("padding")));

    match flow_axis(node) {
        Some(axis) => {
            let gap = node.prop_f64("gap").unwrap_or(0.0).max(0.0);
            let align = align(node.prop_str("align"));
            let placed = place_flow(&node.children, content, axis, gap, align);
            for (child, b) in node.children.iter_mut().zip(placed) {
                resolve_at(child, b);
            }
        }
        None => {
            for child in &mut node.children {
                let b = place_free(child, content);
                resolve_at(child, b);
            }
        }
    }
}

fn place_free(node: &LayoutNode, area: Bounds) -> Bounds {
    let dx = length(node.prop("x"), area.width).unwrap_or(0.0);
    let dy = length(node.prop("y"), area.height).unwrap_or(0.0);
    let w = length(node.prop("width"), area.width).unwrap_or(area.width - dx);
    let h = length(node.prop("height"), area.height).unwrap_or(area.height - dy);
    Bounds::new(area.x + dx, area.y + dy, w, h)
}

fn place_flow(
    children: &[LayoutNode],
    content: Bounds,
    axis: Axis,
    gap: f64,
    align: Align,
) -> Vec<Bounds> {
    let (main_len, cross_len) = match axis {
        Axis::Row => (content.width, content.height),
        Axis::Column => (content.height, content.width),
    };
    let (main_key, cross_key) = match axis {
        Axis::Row => ("width", "height"),
        Axis::Column => ("height", "width"),
    };

    let explicit: Vec<Option<f64>> = children
        .iter()
        .map(|c| length(c.prop(main_key), main_len).map(|v| v.max(0.0)))
        .collect();
    let fixed: f64 = explicit.iter().flatten().sum();
    let autos = explicit.iter().filter(|e| e.is_none()).count();
    let gaps = gap * children.len().saturating_sub(1) as f64;
    let share = if autos == 0 {
        0.0
    } else {
        ((main_len - fixed - gaps) / autos as f64).max(0.0)
    };

    let mut cursor = 0.0;
    let mut out = Vec::with_capacity(children.len());
    for (child, main) in children.iter().zip(explicit) {
        let main = main.unwrap_or(share);
        let cross = length(child.prop(cross_key), cross_len)
            .map(|v| v.max(0.0))
            .unwrap_or(cross_len);
        let cross_off = match align {
            Align::Start | Align::Stretch => 0.0,
            Align::Center => (cross_len - cross) * 0.5,
            Align::End => cross_len - cross,
        };
        let (ox, oy) = (
            length(child.prop("x"), content.width).unwrap_or(0.0),
            length(child.prop("y"), content.height).unwrap_or(0.0),
        );
        let b = match axis {
            Axis::Row => Bounds::new(
                content.x + cursor + ox,
                content.y + cross_off + oy,
                main,
                cross,
            ),
            Axis::Column => Bounds::new(
                content.x + cross_off + ox,
                content.y + cursor + oy,
                cross,
                main,
            ),
        };
        out.push(b);
        cursor += main + gap;
    }
    out
}

fn flow_axis(node: &LayoutNode) -> Option<Axis> {
    match node.prop_str("direction") {
        Some("row") => return Some(Axis::Row),
        Some("column") => return Some(Axis::Column),
        _ => {}
    }
    match node.kind.as_str() {
        "row" => Some(Axis::Row),
        "column" => Some(Axis::Column),
        _ => None,
    }
}

fn align(v: Option<&str>) -> Align {
    match v {
        Some("start") => Align::Start,
        Some("center") => Align::Center,
        Some("end") => Align::End,
        _ => Align::Stretch,
    }
}

/// A length prop: a number, a numeric string (optionally suffixed `px`), or `"N%"` of `parent`.
pub(crate) fn length(v: Option<&Value>, parent: f64) -> Option<f64> {
    let out = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if let Some(pct) = s.strip_suffix('%') {
                pct.trim().parse::<f64>().ok()? / 100.0 * parent
            } else {
                s.strip_suffix("px").unwrap_or(s).trim().parse::<f64>().ok()?
            }
        }
        _ => return None,
    };
    out.is_finite().then_some(out)
}

/// `padding` as a number, `[v, h]`, `[t, r, b, l]` or `{top, right, bottom, left}`.
pub(crate) fn padding(v: Option<&Value>) -> Insets {
    let num = |v: &Value| v.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0);
    match v {
        Some(Value::Number(_)) => Insets::uniform(v.map(num).unwrap_or(0.0)),
        Some(Value::Array(a)) if a.len() == 2 => {
            let (vert, horiz) = (num(&a[0]), num(&a[1]));
            Insets {
                top: vert,
                right: horiz,
                bottom: vert,
                left: horiz,
            }
        }
        Some(Value::Array(a)) if a.len() == 4 => Insets {
            top: num(&a[0]),
            right: num(&a[1]),
            bottom: num(&a[2]),
            left: num(&a[3]),
        },
        Some(Value::Object(m)) => {
            let side = |k: &str| m.get(k).map(num).unwrap_or(0.0);
            Insets {
                top: side("top"),
                right: side("right"),
                bottom: side("bottom"),
                left: side("left"),
            }
        }
        _ => Insets::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/resolve.rs"]
mod tests;
