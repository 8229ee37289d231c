//! Macros for ergonomic subject declarations.

/// Implement [`Subject`](crate::subject::Subject) for a struct.
///
/// Listed fields become readable and writable properties, converted
/// through `serde_json`, so each must implement `Serialize` and
/// `DeserializeOwned`. The expansion names every path absolutely and works
/// next to local `Result` or `Option` aliases.
///
/// # Example
///
/// ```
/// use placemark::impl_subject;
/// use placemark::subject::Subject;
///
/// struct Article {
///     marking: Option<String>,
///     tag: String,
/// }
///
/// impl_subject!(Article as "Article" implements ["Publishable"] { marking, tag });
///
/// let mut article = Article { marking: None, tag: "news".to_string() };
/// assert!(article.is_a("Publishable"));
/// article.set_property("marking", serde_json::json!("draft")).unwrap();
/// assert_eq!(article.marking.as_deref(), Some("draft"));
/// ```
#[macro_export]
macro_rules! impl_subject {
    (
        $ty:ty as $name:literal
        $(implements [$($iface:literal),* $(,)?])?
        $({ $($prop:ident),* $(,)? })?
    ) => {
        impl $crate::subject::Subject for $ty {
            fn type_name(&self) -> &str {
                $name
            }

            fn implements(&self) -> &[&str] {
                &[$($($iface),*)?]
            }

            #[allow(unused_variables)]
            fn property(&self, name: &str) -> ::core::option::Option<$crate::__private::serde_json::Value> {
                $($(
                    if name == stringify!($prop) {
                        return $crate::__private::serde_json::to_value(&self.$prop).ok();
                    }
                )*)?
                ::core::option::Option::None
            }

            #[allow(unused_variables)]
            fn set_property(
                &mut self,
                name: &str,
                value: $crate::__private::serde_json::Value,
            ) -> ::core::result::Result<(), $crate::subject::PropertyError> {
                $($(
                    if name == stringify!($prop) {
                        self.$prop = $crate::__private::serde_json::from_value(value).map_err(|e| {
                            $crate::subject::PropertyError::InvalidValue {
                                property: name.to_string(),
                                reason: e.to_string(),
                            }
                        })?;
                        return ::core::result::Result::Ok(());
                    }
                )*)?
                ::core::result::Result::Err($crate::subject::PropertyError::NoSuchProperty {
                    type_name: $name.to_string(),
                    property: name.to_string(),
                })
            }
        }
    };
}
