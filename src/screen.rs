//! Screen declarations: blocks, views and their service dependencies.
//!
//! A [`Block`] is a render site; a [`View`] fills one block and lists the
//! services it needs; a [`Screen`] maps blocks to views and exposes the union
//! of their dependencies to the resolver. Rendering itself happens elsewhere.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::descriptors::ServiceType;
use crate::key::{key_of, ServiceKey};
use crate::traits::Service;

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// A named render site. Blocks compare by identity, not by name.
#[derive(Clone)]
pub struct Block {
    id: u64,
    name: Arc<str>,
}

impl Block {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Block {}

impl std::hash::Hash for Block {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({}#{})", self.name, self.id)
    }
}

/// What a block displays on a given screen, with the services it needs.
#[derive(Clone, Debug)]
pub struct View {
    block: Block,
    dependencies: Vec<ServiceType>,
}

impl View {
    /// Empty view for `block`.
    pub fn new(block: &Block) -> Self {
        Self {
            block: block.clone(),
            dependencies: Vec::new(),
        }
    }

    /// Adds `S` to the view's dependencies.
    pub fn require<S: Service>(self) -> Self {
        self.require_type(ServiceType::of::<S>())
    }

    pub fn require_type(mut self, service_type: ServiceType) -> Self {
        if !self.dependencies.contains(&service_type) {
            self.dependencies.push(service_type);
        }
        self
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn dependencies(&self) -> &[ServiceType] {
        &self.dependencies
    }
}

/// A named application state.
///
/// # Examples
///
/// ```
/// use screenflow::{Block, BuildContext, Screen, Service, ServiceError, View};
///
/// struct Session;
/// struct Feed;
///
/// #[async_trait::async_trait]
/// impl Service for Session {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> { Ok(Session) }
/// }
///
/// #[async_trait::async_trait]
/// impl Service for Feed {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> { Ok(Feed) }
/// }
///
/// let header = Block::new("header");
/// let content = Block::new("content");
///
/// let base = Screen::new("base").define([View::new(&header).require::<Session>()]);
/// let home = base.extend("home", [View::new(&content).require::<Feed>()]);
///
/// assert!(home.requires::<Session>());
/// assert!(home.requires::<Feed>());
/// assert!(!base.requires::<Feed>());
/// assert_eq!(home.dependencies().len(), 2);
/// ```
#[derive(Clone)]
pub struct Screen {
    name: Arc<str>,
    blocks: Vec<(Block, View)>,
    dependencies: Vec<ServiceType>,
}

impl Screen {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets each view on its block, replacing what the block displayed.
    pub fn define(mut self, views: impl IntoIterator<Item = View>) -> Self {
        for view in views {
            self.set_block(view);
        }
        self
    }

    /// Copies the blocks of `base` this screen does not define yet.
    pub fn include(mut self, base: &Screen) -> Self {
        for (block, view) in &base.blocks {
            if self.view(block).is_none() {
                self.set_block(view.clone());
            }
        }
        self
    }

    /// New screen named `name` with every block of `self`, overridden by
    /// `views`.
    pub fn extend(&self, name: impl Into<Arc<str>>, views: impl IntoIterator<Item = View>) -> Screen {
        Screen::new(name).include(self).define(views)
    }

    /// View displayed by `block` on this screen.
    pub fn view(&self, block: &Block) -> Option<&View> {
        self.blocks.iter().find(|(b, _)| b == block).map(|(_, v)| v)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&Block, &View)> {
        self.blocks.iter().map(|(b, v)| (b, v))
    }

    /// Union of every view's dependencies, in declaration order.
    pub fn dependencies(&self) -> &[ServiceType] {
        &self.dependencies
    }

    pub fn requires<S: Service>(&self) -> bool {
        self.requires_key(&key_of::<S>())
    }

    pub fn requires_key(&self, key: &ServiceKey) -> bool {
        self.dependencies.iter().any(|ty| ty.key() == *key)
    }

    fn set_block(&mut self, view: View) {
        match self.blocks.iter_mut().find(|(b, _)| *b == view.block) {
            Some(slot) => slot.1 = view,
            None => self.blocks.push((view.block.clone(), view)),
        }
        self.recompute_dependencies();
    }

    fn recompute_dependencies(&mut self) {
        let mut dependencies: Vec<ServiceType> = Vec::new();
        for ty in self.blocks.iter().flat_map(|(_, view)| view.dependencies.iter()) {
            if !dependencies.contains(ty) {
                dependencies.push(*ty);
            }
        }
        self.dependencies = dependencies;
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("name", &self.name)
            .field("blocks", &self.blocks.iter().map(|(b, _)| b.name()).collect::<Vec<_>>())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::resolver::BuildContext;

    macro_rules! unit_service {
        ($name:ident) => {
            struct $name;

            #[async_trait::async_trait]
            impl Service for $name {
                type Params = ();
                fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
                    Ok($name)
                }
            }
        };
    }

    unit_service!(Auth);
    unit_service!(Menu);
    unit_service!(Editor);

    #[test]
    fn blocks_compare_by_identity() {
        let a = Block::new("main");
        let b = Block::new("main");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn include_never_overwrites() {
        let sidebar = Block::new("sidebar");
        let base = Screen::new("base").define([View::new(&sidebar).require::<Menu>()]);
        let own = Screen::new("own")
            .define([View::new(&sidebar).require::<Editor>()])
            .include(&base);

        assert!(own.requires::<Editor>());
        assert!(!own.requires::<Menu>());
    }

    #[test]
    fn extend_overrides_base_blocks() {
        let sidebar = Block::new("sidebar");
        let header = Block::new("header");
        let base = Screen::new("base").define([
            View::new(&header).require::<Auth>(),
            View::new(&sidebar).require::<Menu>(),
        ]);
        let editing = base.extend("editing", [View::new(&sidebar).require::<Editor>()]);

        assert_eq!(editing.name(), "editing");
        assert!(editing.requires::<Auth>());
        assert!(editing.requires::<Editor>());
        assert!(!editing.requires::<Menu>());
        // base left untouched
        assert!(base.requires::<Menu>());
        assert_eq!(editing.blocks().count(), 2);
    }

    #[test]
    fn dependencies_are_deduplicated_in_order() {
        let a = Block::new("a");
        let b = Block::new("b");
        let screen = Screen::new("s").define([
            View::new(&a).require::<Auth>().require::<Menu>().require::<Auth>(),
            View::new(&b).require::<Menu>().require::<Editor>(),
        ]);
        let names: Vec<_> = screen.dependencies().iter().map(|ty| ty.name()).collect();
        assert_eq!(names, vec!["Auth", "Menu", "Editor"]);
    }
}
