/// Serialization contracts
///
/// Each entity declares two explicit views: the admin view rendered by the
/// administrative API, and the public view safe to hand to anyone holding a
/// reference to the entity. Fields not listed in a view are never rendered,
/// so adding a column to a model never leaks it by accident.

use serde::Serialize;

/// Explicit admin and public renderings of an entity
pub trait Render {
    type Admin: Serialize;
    type Public: Serialize;

    fn admin_view(&self) -> Self::Admin;

    fn public_view(&self) -> Self::Public;
}

/// Which view a caller receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Audience {
    #[default]
    Admin,
    Public,
}

/// Renders an entity to JSON for the given audience
pub fn render<T: Render>(entity: &T, audience: Audience) -> serde_json::Value {
    let rendered = match audience {
        Audience::Admin => serde_json::to_value(entity.admin_view()),
        Audience::Public => serde_json::to_value(entity.public_view()),
    };
    // View structs contain only strings, UUIDs, booleans and timestamps
    rendered.unwrap_or(serde_json::Value::Null)
}
