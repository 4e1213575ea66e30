//! Structural templates every registry starts with
//!
//! `wrap` is the default page card, `area` the default container and
//! `hero` the fallback substituted for unresolvable template ids.

use serde_json::json;

use super::{RenderHandle, Template};
use crate::schema::{Field, InputKind, OptionDescriptor, SchemaNode};

pub const WRAP: &str = "wrap";
pub const AREA: &str = "area";
pub const HERO: &str = "hero";

pub fn templates() -> Vec<Template> {
    vec![wrap(), area(), hero()]
}

/// Page wrapper holding a page's cards
pub fn wrap() -> Template {
    Template::new(WRAP)
        .with_title("Page Wrapper")
        .with_description("Consistent structure around every page")
        .page_card()
        .with_el(RenderHandle::new("CardWrap"))
        .with_base_config(json!({
            "standard": { "spacing": { "verticalSpacing": "none" }, "handling": { "showOnSingle": true } }
        }))
        .with_schema(SchemaNode::object([Field::optional(
            "fixedHeader",
            SchemaNode::boolean(),
        )]))
        .with_options(vec![
            OptionDescriptor::new("fixedHeader", InputKind::Toggle).with_label("Fixed Header")
        ])
}

/// Container for other cards
pub fn area() -> Template {
    Template::new(AREA)
        .with_title("Area")
        .with_description("Container for other elements")
        .with_category(["basic"])
        .container()
        .with_el(RenderHandle::new("ElArea"))
        .with_base_config(json!({ "standard": { "spacing": { "verticalSpacing": "none" } } }))
        .with_schema(SchemaNode::object([]))
}

/// Standard hero section, also the not-found fallback
pub fn hero() -> Template {
    let schema = SchemaNode::object([
        Field::optional(
            "layout",
            SchemaNode::enumeration(["justify", "center", "left", "right"])
                .describe("Visual arrangement of content"),
        ),
        Field::optional("heading", SchemaNode::string().describe("Primary headline")),
        Field::optional("subHeading", SchemaNode::string().describe("Supporting message")),
        Field::optional("superHeading", SchemaNode::string().describe("Eyebrow text")),
        Field::optional(
            "splash",
            SchemaNode::object([Field::optional("url", SchemaNode::string())])
                .describe("Focal image"),
        ),
    ]);

    let options = vec![
        OptionDescriptor::group(
            "content",
            vec![
                OptionDescriptor::new("heading", InputKind::Text).with_label("Main Headline"),
                OptionDescriptor::new("subHeading", InputKind::Textarea)
                    .with_label("Supporting Message"),
                OptionDescriptor::new("superHeading", InputKind::Text).with_label("Eyebrow Text"),
            ],
        )
        .with_label("Content"),
        OptionDescriptor::group(
            "style",
            vec![
                OptionDescriptor::new("layout", InputKind::Select).with_label("Layout Style"),
                OptionDescriptor::new("splash", InputKind::Media).with_label("Splash Image"),
            ],
        )
        .with_label("Style"),
    ];

    Template::new(HERO)
        .with_title("Hero")
        .with_description("Standard hero section")
        .with_category(["basic"])
        .public(true)
        .with_el(RenderHandle::new("ElHero"))
        .with_schema(schema)
        .with_options(options)
}
