/// Uniform result envelope
///
/// Every response of the administrative API has the shape
///
/// ```json
/// { "success": true, "organization": { ... }, "message": "optional" }
/// ```
///
/// where the payload key names the entity (`"organization"`,
/// `"organizations"`, `"permissions"`, ...). Failures carry
/// `"success": false` and a message; an unexpected failure only ever carries
/// the generic internal-error message.
///
/// # Example
///
/// ```
/// use keyward_shared::envelope::Envelope;
/// use keyward_shared::models::organization::{NewOrganization, Organization};
/// use keyward_shared::models::view::Audience;
///
/// let org = Organization::new(NewOrganization { name: "Acme".to_string() });
/// let body = serde_json::to_value(Envelope::entity(&org, Audience::Public)).unwrap();
/// assert_eq!(body["success"], true);
/// assert_eq!(body["organization"]["name"], "Acme");
/// ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::db::record::Record;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::models::view::{render, Audience, Render};

/// A response body in envelope form
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    success: bool,
    payload: Option<(&'static str, JsonValue)>,
    message: Option<String>,
    error_kind: Option<ErrorKind>,
}

impl Envelope {
    /// Successful envelope with an arbitrary payload under `key`
    pub fn ok(key: &'static str, payload: JsonValue) -> Self {
        Self {
            success: true,
            payload: Some((key, payload)),
            message: None,
            error_kind: None,
        }
    }

    /// Successful envelope with only a message
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: None,
            message: Some(message.into()),
            error_kind: None,
        }
    }

    /// One entity rendered for `audience`
    pub fn entity<T: Record + Render>(entity: &T, audience: Audience) -> Self {
        Self::ok(T::KIND.key(), render(entity, audience))
    }

    /// A list of entities rendered for `audience`
    pub fn list<T: Record + Render>(entities: &[T], audience: Audience) -> Self {
        Self::list_with(entities, |_| audience)
    }

    /// A list where each entity picks its own audience
    pub fn list_with<T, F>(entities: &[T], audience_of: F) -> Self
    where
        T: Record + Render,
        F: Fn(&T) -> Audience,
    {
        let items = entities.iter().map(|e| render(e, audience_of(e))).collect();
        Self::ok(T::KIND.plural_key(), JsonValue::Array(items))
    }

    /// Failure envelope; unexpected errors are reduced to the generic message
    pub fn failure(err: &CoreError) -> Self {
        Self {
            success: false,
            payload: None,
            message: Some(err.public_message()),
            error_kind: Some(err.kind()),
        }
    }

    /// Turns an operation result into an envelope, logging failures
    pub fn from_result<T>(
        operation: &str,
        result: CoreResult<T>,
        on_success: impl FnOnce(T) -> Envelope,
    ) -> Self {
        match result {
            Ok(value) => on_success(value),
            Err(err) => {
                err.log(operation);
                Self::failure(&err)
            }
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Kind of the error a failure envelope was built from
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.payload.is_some()) + usize::from(self.message.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("success", &self.success)?;
        if let Some((key, payload)) = &self.payload {
            map.serialize_entry(key, payload)?;
        }
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        map.end()
    }
}
