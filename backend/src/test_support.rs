//! Test utilities for the campus events crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

pub mod event_sync;

pub mod openapi {
    //! Lookups into generated OpenAPI components for schema assertions.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Resolve a component to its `Object` schema or panic naming what it was.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!("schema '{name}' is a $ref to '{}'", reference.ref_location)
            }
            _ => panic!("schema '{name}' is not an Object"),
        }
    }

    /// Property `field` of `obj`; panics when absent.
    pub fn get_property<'a>(obj: &'a Object, field: &str) -> &'a RefOr<Schema> {
        match obj.properties.get(field) {
            Some(property) => property,
            None => panic!("property '{field}' not found"),
        }
    }
}
