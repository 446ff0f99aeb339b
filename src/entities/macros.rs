//! Macros for reducing boilerplate when defining resources
//!
//! These macros generate the repetitive trait implementations needed for
//! each resource type: the [`Resource`](crate::core::entity::Resource)
//! metadata and a [`FieldSource`](crate::core::record::FieldSource) backed
//! by a field table that is built once per type.

/// Implement `Resource` and `FieldSource` for a struct from a declarative
/// field list
///
/// Stored fields map a public (camelCase) name to a struct field; computed
/// fields map a public name to a `&self` method. The struct must have an
/// `id: i64` field.
///
/// # Example
///
/// ```rust,ignore
/// use transit::prelude::*;
///
/// impl_resource!(
///     City,
///     "city",
///     "cities",
///     "id,name,stateId",
///     fields {
///         "id" => id,
///         "name" => name,
///         "stateId" => state_id,
///     }
/// );
///
/// impl_resource!(
///     VehicleEnrollment,
///     "vehicleEnrollment",
///     "vehicleEnrollments",
///     "id,vehicleId,cost",
///     fields {
///         "id" => id,
///         "vehicleId" => vehicle_id,
///     }
///     computed {
///         "cost" => total_cost,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_resource {
    (
        $type:ident,
        $singular:expr,
        $plural:expr,
        $default_fields:expr,
        fields {
            $( $name:literal => $field:ident ),* $(,)?
        }
        $(
            computed {
                $( $computed_name:literal => $method:ident ),* $(,)?
            }
        )?
    ) => {
        impl $crate::core::entity::Resource for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn default_fields() -> &'static str {
                $default_fields
            }

            fn accessors() -> &'static $crate::core::entity::FieldAccessors<Self> {
                use std::sync::OnceLock;
                static ACCESSORS: OnceLock<$crate::core::entity::FieldAccessors<$type>> =
                    OnceLock::new();
                ACCESSORS.get_or_init(|| {
                    $crate::core::entity::FieldAccessors::new(vec![
                        $(
                            (
                                $name,
                                (|entity: &$type| {
                                    $crate::core::field::ToFieldValue::to_field_value(&entity.$field)
                                }) as $crate::core::entity::FieldGetter<$type>,
                            ),
                        )*
                        $($(
                            (
                                $computed_name,
                                (|entity: &$type| {
                                    $crate::core::field::ToFieldValue::to_field_value(&entity.$method())
                                }) as $crate::core::entity::FieldGetter<$type>,
                            ),
                        )*)?
                    ])
                })
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
        }

        impl $crate::core::record::FieldSource for $type {
            fn field_names(&self) -> Vec<&str> {
                <$type as $crate::core::entity::Resource>::accessors().names()
            }

            fn field_value(&self, name: &str) -> Option<$crate::core::field::FieldValue> {
                <$type as $crate::core::entity::Resource>::accessors().get(self, name)
            }
        }
    };
}
