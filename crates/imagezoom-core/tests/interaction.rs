use imagezoom_core::prelude::*;
use imagezoom_testing::{ThumbnailNodes, ZoomTestRule};

fn gallery(count: usize) -> (ZoomTestRule, Vec<ThumbnailNodes>) {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    let nodes = rule.add_gallery(count);
    rule.start(ZoomConfig::new());
    (rule, nodes)
}

#[test]
fn click_on_nested_image_toggles_its_container() {
    let (rule, nodes) = gallery(2);
    let a = nodes[0];

    assert!(rule.click(a.image));
    rule.pump_until_idle();
    assert!(rule.zoom().is_zoomed(a.container));

    assert!(rule.click(a.image));
    rule.pump_until_idle();
    assert_eq!(rule.zoom().phase(a.container), Some(ZoomPhase::Idle));
}

#[test]
fn click_while_animating_is_swallowed() {
    let (rule, nodes) = gallery(1);
    let a = nodes[0];

    assert!(rule.click(a.container));
    assert!(rule.click(a.container));
    rule.pump_until_idle();
    assert_eq!(rule.count(ZoomTopic::ZoomInStart), 1);
    assert!(rule.zoom().is_zoomed(a.container));
}

#[test]
fn click_outside_marked_elements_is_not_handled() {
    let (rule, _) = gallery(1);
    let paragraph = rule.platform().create_node("p", Some(rule.root()));
    let span = rule.platform().create_node("span", Some(paragraph));

    assert!(!rule.click(span));
    assert!(!rule.click(rule.root()));
    assert!(rule.events().is_empty());
}

#[test]
fn marked_but_unregistered_element_needs_attach() {
    let (rule, _) = gallery(1);
    let late = rule.platform().create_node("a", Some(rule.root()));
    rule.platform().set_attribute(late, "data-zoomable", "");

    assert!(!rule.click(late));
    assert!(rule.zoom().attach(late));
    assert!(!rule.zoom().attach(late));
    assert!(rule.click(late));
    assert_eq!(rule.zoom().registered().last(), Some(&late));
}

#[test]
fn custom_marker_attribute_drives_delegation() {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    let nodes = rule.add_gallery(1);
    rule.platform()
        .set_attribute(nodes[0].container, "data-lightbox", "");
    rule.start(ZoomConfig::new().with_marker_attribute("data-lightbox"));

    assert!(rule.click(nodes[0].image));
}

#[test]
fn destroy_unregisters_everything() {
    let (rule, nodes) = gallery(2);
    let a = nodes[0].container;
    rule.zoom_in_fully(a);
    rule.take_events();

    rule.zoom().destroy();
    assert!(rule.zoom().is_destroyed());
    assert!(rule.zoom().registered().is_empty());
    assert!(rule.zoom().zoomed_stack().is_empty());
    assert_eq!(rule.zoom().phase(a), None);

    assert!(!rule.click(nodes[1].image));
    assert!(!rule.press_key(Key::Escape));
    rule.zoom().zoom_in(nodes[1].container);
    rule.scroll_to(400.0);
    rule.resize(Size::new(200.0, 200.0));
    rule.pump_until_idle();
    rule.advance_time(1000.0);
    assert!(rule.events().is_empty());
    assert!(!rule.zoom().attach(a));
}

#[test]
fn destroy_turns_pending_callbacks_into_no_ops() {
    let (rule, nodes) = gallery(1);
    let a = nodes[0].container;
    rule.zoom().zoom_in(a);
    rule.resize(Size::new(500.0, 500.0));

    rule.zoom().destroy();
    rule.pump_until_idle();
    rule.advance_time(500.0);

    assert_eq!(rule.topics(), vec![ZoomTopic::ZoomInStart]);
    assert_eq!(rule.platform().pending_timers(), 0);
    assert!(!rule.platform().has_class(a, "is-zooming"));
}

#[test]
fn destroy_is_idempotent_and_silences_new_subscriptions() {
    let (rule, _) = gallery(1);
    rule.zoom().destroy();
    rule.zoom().destroy();

    let subscription = rule.zoom().on(ZoomTopic::ZoomInStart, |_| {});
    assert!(!subscription.is_active());
}

#[test]
fn dropping_the_last_handle_disarms_callbacks() {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    let nodes = rule.add_gallery(1);
    let platform = rule.platform().clone();
    {
        let zoom = ImageZoom::new(platform.clone(), [nodes[0].container], ZoomConfig::new());
        zoom.zoom_in(nodes[0].container);
    }

    assert_eq!(platform.pending_frames(), 1);
    platform.run_frame();
    assert_eq!(platform.pending_transitions(), 0);
    assert!(!platform.has_class(nodes[0].container, "is-zooming"));
}
