use spark_vdom::{
    h, mount, props, reconcile, EventDispatch, HostOp, MemoryHost, NodeId, PropValue, VNode,
};
use std::cell::Cell;
use std::rc::Rc;

fn mounted(tree: &mut VNode) -> (MemoryHost, NodeId) {
    let mut host = MemoryHost::new();
    let root = host.create_root("root");
    mount(&mut host, tree, root).unwrap();
    host.clear_ops();
    (host, root)
}

fn child_el(tree: &VNode, index: usize) -> NodeId {
    tree.children.as_nodes().unwrap()[index].el().unwrap()
}

#[test]
fn test_identical_copy_is_a_no_op() {
    let build = || {
        h!("section", { "class" => "card", "data-n" => 3 }, vec![
            h!("h1", "title"),
            h!("ul", vec![h!("li", "a"), h!("li", { "hidden" => true }, "b")]),
            h!("p", ()),
        ])
    };
    let mut prev = build();
    let (mut host, root) = mounted(&mut prev);

    let mut next = build();
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    assert!(host.ops().is_empty());
    assert_eq!(next.el(), prev.el());
    assert_eq!(child_el(&next, 1), child_el(&prev, 1));
}

#[test]
fn test_property_diff_touches_only_changes() {
    let mut prev = h("div", props! { "a" => 1, "b" => 2 }, ());
    let (mut host, root) = mounted(&mut prev);
    let el = prev.el().unwrap();

    let mut next = h("div", props! { "a" => 1, "c" => 3 }, ());
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::SetProperty { node: el, key: "c".into(), value: "3".into() },
            HostOp::RemoveProperty { node: el, key: "b".into() },
        ]
    );
    assert_eq!(host.property(el, "a"), Some(&PropValue::Int(1)));
    assert_eq!(host.property(el, "b"), None);
}

#[test]
fn test_text_to_sequence_clears_then_mounts_in_order() {
    let mut prev = h!("div", "hello");
    let (mut host, root) = mounted(&mut prev);
    let el = prev.el().unwrap();

    let mut next = h!("div", vec![h!("a", "A"), h!("b", "B")]);
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    let (a, b) = (child_el(&next, 0), child_el(&next, 1));
    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::SetText { node: el, text: String::new() },
            HostOp::CreateNode { node: a, tag: "a".into() },
            HostOp::SetText { node: a, text: "A".into() },
            HostOp::AppendChild { parent: el, child: a },
            HostOp::CreateNode { node: b, tag: "b".into() },
            HostOp::SetText { node: b, text: "B".into() },
            HostOp::AppendChild { parent: el, child: b },
        ]
    );
    assert_eq!(host.to_markup(el), "<div><a>A</a><b>B</b></div>");
}

#[test]
fn test_positional_diff_removes_trailing_child() {
    let mut prev = h!("ul", vec![h!("li", "A"), h!("li", "B"), h!("li", "C")]);
    let (mut host, root) = mounted(&mut prev);
    let ul = prev.el().unwrap();
    let (a, b, c) = (child_el(&prev, 0), child_el(&prev, 1), child_el(&prev, 2));

    let mut next = h!("ul", vec![h!("li", "A'"), h!("li", "B'")]);
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::SetText { node: a, text: "A'".into() },
            HostOp::SetText { node: b, text: "B'".into() },
            HostOp::RemoveChild { parent: ul, child: c },
        ]
    );
    assert_eq!(host.children(ul), &[a, b]);
}

#[test]
fn test_extension_reconciles_head_then_mounts_tail() {
    let mut prev = h!("ul", vec![h!("li", "A")]);
    let (mut host, root) = mounted(&mut prev);
    let ul = prev.el().unwrap();
    let a = child_el(&prev, 0);

    let mut next = h!("ul", vec![h!("li", "A"), h!("li", "B"), h!("li", "C")]);
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    let (b, c) = (child_el(&next, 1), child_el(&next, 2));
    assert_eq!(child_el(&next, 0), a);
    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::CreateNode { node: b, tag: "li".into() },
            HostOp::SetText { node: b, text: "B".into() },
            HostOp::AppendChild { parent: ul, child: b },
            HostOp::CreateNode { node: c, tag: "li".into() },
            HostOp::SetText { node: c, text: "C".into() },
            HostOp::AppendChild { parent: ul, child: c },
        ]
    );
}

#[test]
fn test_root_tag_change_replaces_whole_subtree() {
    let mut prev = h!("div", { "id" => "x" }, vec![h!("span", "inside")]);
    let (mut host, root) = mounted(&mut prev);
    let old = prev.el().unwrap();

    let mut next = h!("article", { "id" => "x" }, vec![h!("span", "inside")]);
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    let fresh = next.el().unwrap();
    assert_ne!(fresh, old);
    assert_eq!(
        host.ops().last(),
        Some(&HostOp::ReplaceChild { parent: root, new_child: fresh, old_child: old })
    );
    assert_eq!(host.children(root), &[fresh]);
    assert_eq!(host.parent(old), None);
    assert_eq!(
        host.to_markup(root),
        r#"<root><article id="x"><span>inside</span></article></root>"#
    );
}

#[test]
fn test_sequence_to_text_tears_down_listeners() {
    let clicks = Rc::new(Cell::new(0));
    let handler = PropValue::handler({
        let clicks = clicks.clone();
        move |_| clicks.set(clicks.get() + 1)
    });
    let mut prev = h!("div", vec![h("button", props! { "onClick" => handler }, "+")]);
    let (mut host, root) = mounted(&mut prev);
    let div = prev.el().unwrap();
    let button = child_el(&prev, 0);
    assert_eq!(host.listeners(button, "click").len(), 1);

    let mut next = h!("div", "gone");
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    assert_eq!(
        host.take_ops(),
        vec![
            HostOp::RemoveChild { parent: div, child: button },
            HostOp::RemoveEventListener { node: button, event: "click".into() },
            HostOp::SetText { node: div, text: "gone".into() },
        ]
    );
    assert!(host.listeners(button, "click").is_empty());
    assert_eq!(clicks.get(), 0);
}

#[test]
fn test_removed_handler_prop_removes_listener() {
    let mut prev = h("input", props! { "onInput" => PropValue::handler(|_| {}), "value" => "a" }, ());
    let (mut host, root) = mounted(&mut prev);
    let el = prev.el().unwrap();

    let mut next = h("input", props! { "value" => "a" }, ());
    reconcile(&mut host, &prev, &mut next, root).unwrap();

    assert_eq!(
        host.take_ops(),
        vec![HostOp::RemoveEventListener { node: el, event: "input".into() }]
    );
}

#[test]
fn test_reconciled_tree_can_be_reconciled_again() {
    let mut first = h!("p", "1");
    let (mut host, root) = mounted(&mut first);
    let el = first.el().unwrap();

    let mut second = h!("p", "2");
    reconcile(&mut host, &first, &mut second, root).unwrap();
    let mut third = h!("p", "3");
    reconcile(&mut host, &second, &mut third, root).unwrap();

    assert_eq!(third.el(), Some(el));
    assert_eq!(host.text(el), Some("3"));
    assert_eq!(host.take_ops().len(), 2);
}
