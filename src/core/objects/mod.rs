//=========================================================================
// Game Objects
//=========================================================================
//
// Everything that lives in a scene tree implements [`GameObject`]. The
// trait is object safe; the engine stores children as
// `Box<dyn GameObject>` and reaches concrete types through `AsAny`.
//
// Identity:
//   ObjectId  - unique per process, assigned when added to a container
//   Kind      - the concrete type, plus any extra kinds an object
//               declares (e.g. a `Player` that is also a `Sprite`)
//   Tag       - free-form labels chosen by the caller
//
//=========================================================================

//=== Module Declarations =================================================

mod children;

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

//=== Internal Dependencies ===============================================

use crate::core::errors::ObjectError;
use crate::core::events::Handlers;
use crate::core::properties::{Properties, Value};
use crate::core::scene::Sprite;

//=== Public API ==========================================================

pub use children::{walk, Children, Walk};

//=== AsAny ===============================================================

/// Access to the concrete type behind a trait object.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== GameObject ==========================================================

/// A node of the scene tree.
///
/// Every method has a default, so a plain `impl GameObject for T {}` is
/// a valid leaf object without handlers.
pub trait GameObject: AsAny {
    /// Handler table consulted during dispatch.
    fn handlers(&self) -> Option<&Handlers> {
        None
    }

    /// Nested children, walked after this object's own handler.
    fn children(&self) -> Option<&Children> {
        None
    }

    fn children_mut(&mut self) -> Option<&mut Children> {
        None
    }

    /// Extra kinds this object is indexed under, beyond its concrete type.
    fn kinds(&self) -> Vec<Kind> {
        Vec::new()
    }

    /// Sprite data read by the renderer.
    fn sprite(&self) -> Option<&Sprite> {
        None
    }

    /// Render layer; lower layers draw first.
    fn layer(&self) -> f32 {
        self.sprite().map_or(0.0, |sprite| sprite.layer)
    }

    /// Fully qualified name of the concrete type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

//=== ObjectId ============================================================

/// Process-unique identity of a game object inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

//=== Kind ================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KindId {
    Type(TypeId),
    Named(&'static str),
}

/// Index key for selecting children by type.
///
/// Equality and hashing use the identity only; `name` is for display.
#[derive(Clone, Copy)]
pub struct Kind {
    id: KindId,
    name: &'static str,
}

impl Kind {
    /// Every object in a container is indexed under this kind.
    pub const GAME_OBJECT: Kind = Kind::named("GameObject");

    /// Kind of the concrete type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: KindId::Type(TypeId::of::<T>()),
            name: std::any::type_name::<T>(),
        }
    }

    /// An abstract kind with no backing type.
    pub const fn named(name: &'static str) -> Self {
        Self {
            id: KindId::Named(name),
            name,
        }
    }

    /// Kind of the concrete type behind `object`.
    pub fn of_object(object: &dyn GameObject) -> Self {
        Self {
            id: KindId::Type(object.as_any().type_id()),
            name: object.type_name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.name)
    }
}

//=== Tag =================================================================

/// Free-form label attached to a child when it is added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    /// Tag of the scene's main camera.
    pub const MAIN_CAMERA: Tag = Tag(Cow::Borrowed("main_camera"));

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Tag {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&Tag> for Tag {
    fn from(tag: &Tag) -> Self {
        tag.clone()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=== Node ================================================================

/// General-purpose game object: children, handlers and attributes.
///
/// ```
/// use aetheric_2d::prelude::*;
///
/// let mut level = Node::new().with("name", "level-1");
/// level.add(Node::new().with("name", "door"));
/// assert_eq!(level.children.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Node {
    pub children: Children,
    pub handlers: Handlers,
    pub properties: Properties,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword-style attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.merge(&properties);
        self
    }

    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    //--- Shorthand --------------------------------------------------------

    pub fn add<O: GameObject>(&mut self, child: O) -> ObjectId {
        self.children.add(child)
    }

    pub fn add_tagged<O, I>(&mut self, child: O, tags: I) -> ObjectId
    where
        O: GameObject,
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        self.children.add_tagged(child, tags)
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<Box<dyn GameObject>, ObjectError> {
        self.children.remove(id)
    }

    pub fn get(
        &self,
        kind: Option<Kind>,
        tag: Option<&Tag>,
    ) -> Result<impl Iterator<Item = &dyn GameObject> + '_, ObjectError> {
        self.children.get(kind, tag)
    }
}

impl GameObject for Node {
    fn handlers(&self) -> Option<&Handlers> {
        Some(&self.handlers)
    }

    fn children(&self) -> Option<&Children> {
        Some(&self.children)
    }

    fn children_mut(&mut self) -> Option<&mut Children> {
        Some(&mut self.children)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl GameObject for Marker {}

    #[test]
    fn object_ids_are_unique() {
        let a = ObjectId::next();
        let b = ObjectId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn kinds_compare_by_identity() {
        assert_eq!(Kind::of::<Marker>(), Kind::of_object(&Marker));
        assert_ne!(Kind::of::<Marker>(), Kind::of::<Node>());
        assert_eq!(Kind::named("Enemy"), Kind::named("Enemy"));
        assert!(Kind::of::<Marker>().name().ends_with("Marker"));
    }

    #[test]
    fn type_name_reports_concrete_type() {
        let object: Box<dyn GameObject> = Box::new(Marker);
        assert!(object.type_name().ends_with("tests::Marker"));
        assert!(format!("{object:?}").ends_with("Marker"));
    }

    #[test]
    fn tags_from_static_and_owned_strings_match() {
        assert_eq!(Tag::from("main_camera"), Tag::MAIN_CAMERA);
        assert_eq!(Tag::from(String::from("enemy")), Tag::new("enemy"));
    }

    #[test]
    fn node_keeps_keyword_attributes() {
        let node = Node::new().with("hp", 10).with("name", "slime");
        assert_eq!(node.properties.get_i64("hp"), Some(10));
        assert_eq!(node.properties.get_str("name"), Some("slime"));
    }
}
