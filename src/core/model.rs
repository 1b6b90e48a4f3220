//! The contract a configuration model fulfils.

use crate::error::ValidationError;
use crate::sources::Properties;

/// A typed configuration object that can be loaded from and saved to
/// [`Properties`].
///
/// The manager stages every reload on a clone of the current model, so a
/// failing [`load`](ConfigModel::load) never leaves the live model half
/// updated.
///
/// # Examples
///
/// ```rust
/// use hotswap_props::core::ConfigModel;
/// use hotswap_props::error::ValidationError;
/// use hotswap_props::sources::Properties;
///
/// #[derive(Debug, Clone, Default)]
/// struct Worker {
///     name: String,
///     age: u8,
///     sleeps: bool,
///     codes: bool,
/// }
///
/// impl ConfigModel for Worker {
///     fn load(&mut self, properties: &Properties) -> Result<(), ValidationError> {
///         self.name = properties.get_or("name", "John Doe").to_string();
///         self.age = properties
///             .get_or("age", "28")
///             .parse()
///             .map_err(|e| ValidationError::invalid_field("age", format!("{e}")))?;
///         self.sleeps = properties.get_or("sleeps", "false") == "true";
///         self.codes = properties.get_or("codes", "true") == "true";
///         Ok(())
///     }
///
///     fn to_properties(&self) -> Properties {
///         [
///             ("name", self.name.clone()),
///             ("age", self.age.to_string()),
///             ("sleeps", self.sleeps.to_string()),
///             ("codes", self.codes.to_string()),
///         ]
///         .into_iter()
///         .collect()
///     }
///
///     fn validate(&mut self) {
///         // Nobody sleeps while coding.
///         if self.codes && self.sleeps {
///             self.sleeps = false;
///         }
///     }
/// }
/// ```
pub trait ConfigModel: Clone + Send + 'static {
    /// Populate fields from `properties`, applying defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` when a present value cannot be parsed
    /// into its field's type.
    fn load(&mut self, properties: &Properties) -> Result<(), ValidationError>;

    /// Serialize every field to its string form.
    fn to_properties(&self) -> Properties;

    /// Normalize field values after a load and before a save.
    ///
    /// This hook is advisory and cannot fail. The default does nothing.
    fn validate(&mut self) {}
}
