use imagezoom_core::prelude::*;
use imagezoom_core::{declared_size, Rect, ZoomError};
use imagezoom_testing::{RecordedEvent, Thumbnail, ThumbnailNodes, ZoomTestRule};

fn single(href: &str, config: ZoomConfig) -> (ZoomTestRule, ThumbnailNodes) {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    let nodes = rule.add_thumbnail(Thumbnail::new(
        Rect::new(100.0, 100.0, 200.0, 150.0),
        Size::new(1600.0, 1200.0),
        href,
    ));
    rule.start(config);
    (rule, nodes)
}

#[test]
fn high_resolution_source_replaces_thumbnail_after_zoom() {
    let (rule, nodes) = single("large/photo.JPG", ZoomConfig::new());
    let platform = rule.platform();

    rule.zoom().zoom_in(nodes.container);
    rule.advance_frame();
    assert!(platform.load_requests().is_empty());

    rule.finish_transitions();
    assert_eq!(platform.load_requests(), vec!["large/photo.JPG".to_owned()]);
    assert_eq!(platform.attribute(nodes.image, "src").as_deref(), Some("thumb.jpg"));

    rule.complete_loads();
    assert_eq!(
        platform.attribute(nodes.image, "src").as_deref(),
        Some("large/photo.JPG")
    );
    assert!(!platform.has_attribute(nodes.image, "srcset"));
    assert!(!platform.has_attribute(nodes.image, "sizes"));
    assert!(rule.zoom().is_promoted(nodes.image));
    assert_eq!(
        rule.events().last().copied(),
        Some(RecordedEvent::new(ZoomTopic::ImageLoaded, nodes.container))
    );
}

#[test]
fn image_is_loaded_once_across_zoom_cycles() {
    let (rule, nodes) = single("photo.png", ZoomConfig::new());

    for _ in 0..3 {
        rule.zoom_in_fully(nodes.container);
        rule.zoom().zoom_out(nodes.container);
        rule.pump_until_idle();
    }

    assert_eq!(rule.platform().load_requests().len(), 1);
    assert_eq!(rule.count(ZoomTopic::ImageLoaded), 1);
    assert_eq!(rule.count(ZoomTopic::ZoomInEnd), 3);
}

#[test]
fn late_completions_announce_the_image_once() {
    let (rule, nodes) = single("photo.gif", ZoomConfig::new());
    let a = nodes.container;

    rule.zoom().zoom_in(a);
    rule.advance_frame();
    rule.finish_transitions();
    rule.zoom().zoom_out(a);
    rule.advance_frame();
    rule.finish_transitions();
    rule.zoom().zoom_in(a);
    rule.advance_frame();
    rule.finish_transitions();

    assert_eq!(rule.platform().pending_loads(), 2);
    rule.complete_loads();
    assert_eq!(rule.count(ZoomTopic::ImageLoaded), 1);
    assert!(rule.zoom().is_promoted(nodes.image));

    rule.zoom().zoom_out(a);
    rule.pump_until_idle();
    rule.zoom_in_fully(a);
    assert_eq!(rule.platform().load_requests().len(), 2);
}

#[test]
fn failed_load_is_retried_on_the_next_zoom() {
    let (rule, nodes) = single("photo.jpg", ZoomConfig::new());
    let a = nodes.container;
    rule.platform().fail_loads_of("photo.jpg");

    rule.zoom_in_fully(a);
    rule.zoom().zoom_out(a);
    rule.pump_until_idle();
    rule.zoom_in_fully(a);

    assert_eq!(
        rule.platform().load_requests(),
        vec!["photo.jpg".to_owned(), "photo.jpg".to_owned()]
    );
    assert!(!rule.zoom().is_promoted(nodes.image));
}

#[test]
fn unsupported_extension_is_never_loaded() {
    let (rule, nodes) = single("photos/large.webp", ZoomConfig::new());
    rule.zoom_in_fully(nodes.container);

    assert!(rule.zoom().is_zoomed(nodes.container));
    assert!(rule.platform().load_requests().is_empty());
    assert_eq!(rule.count(ZoomTopic::ImageLoaded), 0);
    assert!(rule.platform().has_attribute(nodes.image, "srcset"));
}

#[test]
fn failed_load_leaves_thumbnail_in_place() {
    let (rule, nodes) = single("photo.jpeg", ZoomConfig::new());
    rule.platform().fail_loads_of("photo.jpeg");
    rule.zoom_in_fully(nodes.container);

    assert!(!rule.zoom().is_promoted(nodes.image));
    assert_eq!(rule.count(ZoomTopic::ImageLoaded), 0);
    assert_eq!(
        rule.platform().attribute(nodes.image, "src").as_deref(),
        Some("thumb.jpg")
    );
}

#[test]
fn promotion_waits_for_configured_delay() {
    let (rule, nodes) = single("photo.tiff", ZoomConfig::new().with_promotion_delay(300));
    rule.zoom_in_fully(nodes.container);
    assert!(rule.platform().load_requests().is_empty());

    rule.advance_time(300.0);
    assert_eq!(rule.platform().load_requests().len(), 1);
    rule.complete_loads();
    assert!(rule.zoom().is_promoted(nodes.image));
}

#[test]
fn container_without_image_is_still_zoomable() {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    rule.add_thumbnail(Thumbnail::new(
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Size::new(400.0, 400.0),
        "photo.jpg",
    ));
    let plain = rule.platform().create_node("div", Some(rule.root()));
    rule.platform().set_attribute(plain, "href", "other.jpg");
    rule.platform().set_attribute(plain, "data-width", "400");
    rule.platform().set_attribute(plain, "data-height", "300");
    rule.start(ZoomConfig::new());
    rule.zoom().attach(plain);

    rule.zoom_in_fully(plain);
    assert!(rule.zoom().is_zoomed(plain));
    assert!(rule.platform().load_requests().is_empty());
}

#[test]
fn last_image_child_receives_the_source() {
    let mut rule = ZoomTestRule::new(Size::new(1000.0, 800.0));
    let nodes = rule.add_thumbnail(Thumbnail::new(
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Size::new(400.0, 400.0),
        "photo.jpg",
    ));
    let second = rule.platform().create_node("img", Some(nodes.container));
    rule.start(ZoomConfig::new());

    rule.zoom_in_fully(nodes.container);
    assert_eq!(
        rule.platform().attribute(second, "src").as_deref(),
        Some("photo.jpg")
    );
    assert_eq!(
        rule.platform().attribute(nodes.image, "src").as_deref(),
        Some("thumb.jpg")
    );
}

#[test]
fn declared_size_reports_problems() {
    let (rule, nodes) = single("photo.jpg", ZoomConfig::new());
    let platform = rule.platform();
    let a = nodes.container;

    assert_eq!(declared_size(platform, a), Ok(Size::new(1600.0, 1200.0)));

    platform.set_attribute(a, "data-height", "-5");
    assert_eq!(
        declared_size(platform, a),
        Err(ZoomError::InvalidDimension {
            node: a,
            attribute: "data-height",
            value: "-5".to_owned(),
        })
    );

    assert_eq!(
        declared_size(platform, nodes.image),
        Err(ZoomError::MissingDimension {
            node: nodes.image,
            attribute: "data-width",
        })
    );
}
