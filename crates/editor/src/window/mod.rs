//! Window tree and views.
//!
//! The tree always has a root window ([`WindowId::ROOT`]) which cannot be
//! closed. Every window owns exactly one view; command and key binding
//! scopes live on views and are searched from a window up to the root.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kiln_primitives::{DocumentId, Size, ViewId, WindowId};

use crate::commands::Commands;
use crate::keymap::KeyBindings;

mod factory;

pub use factory::{ViewFactories, ViewFactory};

/// Placement of a window inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Docking {
	Fill,
	Floating,
	Left,
	Right,
	Top,
	Bottom,
}

impl Docking {
	pub const ALL: [Self; 6] = [Self::Fill, Self::Floating, Self::Left, Self::Right, Self::Top, Self::Bottom];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Fill => "fill",
			Self::Floating => "floating",
			Self::Left => "left",
			Self::Right => "right",
			Self::Top => "top",
			Self::Bottom => "bottom",
		}
	}
}

impl fmt::Display for Docking {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Docking {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|docking| docking.as_str() == s)
			.ok_or_else(|| format!("unknown docking type \"{s}\""))
	}
}

/// What a window shows, plus the command and key binding scope attached to it.
#[derive(Clone)]
pub struct View {
	pub id: ViewId,
	pub factory: String,
	pub title: String,
	/// Disabled views cannot be activated.
	pub disabled: bool,
	pub document: Option<DocumentId>,
	pub commands: Commands,
	pub keybindings: KeyBindings,
}

impl View {
	pub fn new(id: ViewId, factory: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			id,
			factory: factory.into(),
			title: title.into(),
			disabled: false,
			document: None,
			commands: Commands::default(),
			keybindings: KeyBindings::default(),
		}
	}

	pub fn disabled(mut self) -> Self {
		self.disabled = true;
		self
	}
}

impl fmt::Debug for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("View")
			.field("id", &self.id)
			.field("factory", &self.factory)
			.field("title", &self.title)
			.field("disabled", &self.disabled)
			.field("document", &self.document)
			.field("commands", &self.commands.len())
			.finish()
	}
}

#[derive(Debug)]
pub struct Window {
	pub id: WindowId,
	pub parent: Option<WindowId>,
	pub children: Vec<WindowId>,
	pub docking: Docking,
	pub view: View,
}

/// Reasons a child window cannot be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
	NoSuchWindow(WindowId),
	/// The parent already has a child with this non-floating docking.
	DockingTaken(WindowId, Docking),
	RootIsPermanent,
}

impl fmt::Display for TreeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoSuchWindow(id) => write!(f, "no window with id {id}"),
			Self::DockingTaken(id, docking) => write!(f, "window {id} already has a child docked {docking}"),
			Self::RootIsPermanent => f.write_str("the root window cannot be closed"),
		}
	}
}

impl std::error::Error for TreeError {}

pub struct WindowTree {
	windows: BTreeMap<WindowId, Window>,
	next_window: u32,
	next_view: u32,
	size: Size,
}

impl WindowTree {
	/// A tree holding only the root window, which shows `root_view`.
	pub fn new(size: Size, root_view: impl FnOnce(ViewId) -> View) -> Self {
		let root = Window {
			id: WindowId::ROOT,
			parent: None,
			children: Vec::new(),
			docking: Docking::Fill,
			view: root_view(ViewId(0)),
		};
		Self {
			windows: BTreeMap::from([(WindowId::ROOT, root)]),
			next_window: 1,
			next_view: 1,
			size,
		}
	}

	pub fn size(&self) -> Size {
		self.size
	}

	pub fn resize(&mut self, size: Size) {
		self.size = size;
	}

	pub fn get(&self, id: WindowId) -> Option<&Window> {
		self.windows.get(&id)
	}

	pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
		self.windows.get_mut(&id)
	}

	pub fn contains(&self, id: WindowId) -> bool {
		self.windows.contains_key(&id)
	}

	pub fn root(&self) -> &Window {
		&self.windows[&WindowId::ROOT]
	}

	pub fn len(&self) -> usize {
		self.windows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.windows.is_empty()
	}

	/// `id` followed by each of its ancestors up to the root. Empty if `id`
	/// is not in the tree.
	pub fn ancestors(&self, id: WindowId) -> Ancestors<'_> {
		Ancestors {
			tree: self,
			next: self.contains(id).then_some(id),
		}
	}

	/// Attaches a new window built by `view` under `parent`.
	///
	/// With `exclusive` set, a parent may hold at most one child per
	/// non-floating docking.
	pub fn attach(
		&mut self,
		parent: WindowId,
		docking: Docking,
		exclusive: bool,
		view: impl FnOnce(ViewId) -> View,
	) -> Result<WindowId, TreeError> {
		let siblings = &self.windows.get(&parent).ok_or(TreeError::NoSuchWindow(parent))?.children;
		if exclusive
			&& docking != Docking::Floating
			&& siblings.iter().any(|child| self.windows[child].docking == docking)
		{
			return Err(TreeError::DockingTaken(parent, docking));
		}

		let id = WindowId(self.next_window);
		self.next_window += 1;
		let view = view(ViewId(self.next_view));
		self.next_view += 1;

		self.windows.insert(
			id,
			Window {
				id,
				parent: Some(parent),
				children: Vec::new(),
				docking,
				view,
			},
		);
		if let Some(parent) = self.windows.get_mut(&parent) {
			parent.children.push(id);
		}
		Ok(id)
	}

	/// Removes `id` and its whole subtree, returning the removed ids in
	/// depth-first order.
	pub fn close(&mut self, id: WindowId) -> Result<Vec<WindowId>, TreeError> {
		if id.is_root() {
			return Err(TreeError::RootIsPermanent);
		}
		let parent = self.windows.get(&id).ok_or(TreeError::NoSuchWindow(id))?.parent;

		let removed = self.depth_first(id);
		for window in &removed {
			self.windows.remove(window);
		}
		if let Some(parent) = parent.and_then(|p| self.windows.get_mut(&p)) {
			parent.children.retain(|child| *child != id);
		}
		Ok(removed)
	}

	/// Pre-order walk of the subtree at `from`.
	pub fn depth_first(&self, from: WindowId) -> Vec<WindowId> {
		let mut out = Vec::new();
		let mut stack = vec![from];
		while let Some(id) = stack.pop() {
			let Some(window) = self.windows.get(&id) else { continue };
			out.push(id);
			stack.extend(window.children.iter().rev());
		}
		out
	}

	/// Indented listing of the tree, one window per line.
	pub fn describe(&self) -> String {
		let mut out = String::new();
		self.describe_into(WindowId::ROOT, 0, &mut out);
		out
	}

	fn describe_into(&self, id: WindowId, depth: usize, out: &mut String) {
		let Some(window) = self.windows.get(&id) else { return };
		out.push_str(&format!(
			"{:indent$}{} [{}] {} ({})\n",
			"",
			window.id,
			window.docking,
			window.view.title,
			window.view.factory,
			indent = depth * 2
		));
		for child in &window.children {
			self.describe_into(*child, depth + 1, out);
		}
	}
}

pub struct Ancestors<'a> {
	tree: &'a WindowTree,
	next: Option<WindowId>,
}

impl<'a> Iterator for Ancestors<'a> {
	type Item = &'a Window;

	fn next(&mut self) -> Option<Self::Item> {
		let window = self.tree.get(self.next?)?;
		self.next = window.parent;
		Some(window)
	}
}
