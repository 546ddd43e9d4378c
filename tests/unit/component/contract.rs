use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::style::resolver::ComputedStyles;

struct Harness {
    surface: Surface,
    node: LayoutNode,
    styles: ComputedStyles,
    tokens: TokenMap,
    assets: BTreeMap<String, Arc<LoadedImage>>,
    fonts: FontBook,
}

impl Harness {
    fn new(node: LayoutNode, tokens: TokenMap) -> Self {
        let mut surface = Surface::new(8, 8).unwrap();
        surface.begin(1.0);
        Self {
            surface,
            node,
            styles: ComputedStyles::default(),
            tokens,
            assets: BTreeMap::new(),
            fonts: FontBook::empty(),
        }
    }

    fn cx(&mut self) -> DrawCx<'_> {
        DrawCx {
            surface: &mut self.surface,
            node: &self.node,
            index: 0,
            bounds: Bounds::new(0.0, 0.0, 8.0, 8.0),
            style: self.styles.node(0),
            tokens: &self.tokens,
            assets: &self.assets,
            fonts: &self.fonts,
        }
    }
}

fn tokens(v: Value) -> TokenMap {
    serde_json::from_value(v).unwrap()
}

#[test]
fn values_dereference_tokens() {
    let node = LayoutNode::new("rect")
        .with_prop("radius", json!("radius.md"))
        .with_prop("fill", json!("accent.primary"))
        .with_prop("width", json!("12"));
    let mut h = Harness::new(
        node,
        tokens(json!({ "radius.md": 8, "accent.primary": "#5865f2" })),
    );
    let cx = h.cx();
    assert_eq!(cx.number("radius"), Some(8.0));
    assert_eq!(cx.number("width"), Some(12.0));
    assert_eq!(cx.color("fill"), Some(Rgba8::rgba(0x58, 0x65, 0xf2, 255)));
    assert_eq!(cx.color_or_token(&["stroke"], "accent.primary"), cx.color("fill"));
    assert_eq!(cx.number("missing"), None);
}

#[test]
fn interpolates_placeholders() {
    let t = tokens(json!({ "username": "ada", "level": 7, "none": null }));
    assert_eq!(interpolate("{{ username }} is level {{level}}", &t), "ada is level 7");
    assert_eq!(interpolate("[{{none}}][{{unknown}}]", &t), "[][]");
    assert_eq!(interpolate("open {{ username", &t), "open {{ username");
    assert_eq!(interpolate("plain", &t), "plain");
}

struct Failing;

impl Component for Failing {
    fn draw(&mut self, _cx: &mut DrawCx<'_>) -> CardResult<()> {
        Err(CardError::render("DRAW", "broken"))
    }
}

struct Counting(Arc<Mutex<Vec<&'static str>>>);

impl Component for Counting {
    fn draw(&mut self, _cx: &mut DrawCx<'_>) -> CardResult<()> {
        self.0.lock().unwrap().push("draw");
        Ok(())
    }
}

#[test]
fn hooks_wrap_draw_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = ComponentHooks::default();
    let (a, b, c) = (log.clone(), log.clone(), log.clone());
    hooks
        .before_render(move |_| {
            a.lock().unwrap().push("before");
            Ok(())
        })
        .after_render(move |_| {
            b.lock().unwrap().push("after");
            Ok(())
        })
        .on_error(move |_, _| c.lock().unwrap().push("error"));

    let mut inst = ComponentInstance::new("x", Box::new(Counting(log.clone())), hooks);
    let mut h = Harness::new(LayoutNode::new("x"), TokenMap::new());
    inst.render(&mut h.cx()).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["before", "draw", "after"]);
    assert_eq!(inst.kind(), "x");
}

#[test]
fn on_error_observes_without_suppressing() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut hooks = ComponentHooks::default();
    let (s1, s2) = (seen.clone(), seen.clone());
    hooks
        .on_error(move |cx, err| s1.lock().unwrap().push(format!("{}:{}", cx.node.kind, err.code())))
        .on_error(move |_, _| s2.lock().unwrap().push("second".to_owned()))
        .after_render(|_| panic!("after_render must not run on failure"));
    assert!(!hooks.is_empty());

    let mut inst = ComponentInstance::new("bad", Box::new(Failing), hooks);
    let mut h = Harness::new(LayoutNode::new("bad"), TokenMap::new());
    let err = inst.render(&mut h.cx()).unwrap_err();
    assert_eq!(err.code(), "DRAW");
    assert_eq!(*seen.lock().unwrap(), vec!["bad:DRAW", "second"]);
}

#[test]
fn before_hook_failure_skips_draw() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = ComponentHooks::default();
    hooks.before_render(|_| Err(CardError::validation("veto")));
    let mut inst = ComponentInstance::new("x", Box::new(Counting(log.clone())), hooks);
    let mut h = Harness::new(LayoutNode::new("x"), TokenMap::new());
    assert!(inst.render(&mut h.cx()).is_err());
    assert!(log.lock().unwrap().is_empty());
}
