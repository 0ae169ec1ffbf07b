//! Profile settings.
//!
//! - [`PropertyDef`] - schema entry: path, encoding, merger, value mapping
//! - [`ProfileSettings`] - the stored settings of one profile
//! - [`ProfileSettingsContainer`] - every profile of a project
//! - [`ActiveSettingsQuery`] - merged values for the selected profile
//! - [`ProfileEditor`] / [`StoredSettings`] - the seam towards settings UIs

mod container;
pub mod definition;
mod editor;
mod key;
mod merge;
mod profile;
mod query;

pub use container::ProfileSettingsContainer;
pub use definition::{
    DefaultedValueDef, FnEncoding, KeyEncoding, OptionalValueDef, PropertyDef, SettingsSchema,
    SettingsSchemaBuilder, StringListEncoding, TextEncoding, TreeEncoding, ValueDef,
};
pub use editor::{
    CompositeEditorFactory, NOT_INITIALIZED, NotInitialized, ProfileEditor, ProfileEditorFactory,
    ProfileSettingsEditor, PropertyEditor, PropertyEditorFactory, StoredSettings,
};
pub use key::{PRIVATE_GROUP, ProfileKey};
pub use merge::{
    ChildOverrides, FirstNonDefault, LazyValueReference, NoParent, UnionMerger, ValueMerger,
    ValueReference,
};
pub use profile::{AuxConfig, ProfileSettings, SingleProfileSettings, SingleProfileSettingsEx};
pub use query::ActiveSettingsQuery;
