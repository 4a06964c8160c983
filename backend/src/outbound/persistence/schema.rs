//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Campuses provisioned by the login flow.
    campuses (campus_id) {
        /// Upstream campus identifier.
        campus_id -> Int8,
        /// Display name.
        name -> Text,
        /// Registered member count.
        member_count -> Int4,
        /// City.
        city -> Text,
        /// Country.
        country -> Text,
    }
}

diesel::table! {
    /// Users known to the service and the campuses they belong to.
    campus_members (user_id) {
        /// Upstream user identifier.
        user_id -> Int8,
        /// Intranet login.
        login -> Text,
        /// Campus memberships; queried with `@>`.
        campus_ids -> Array<Int8>,
    }
}

diesel::table! {
    /// Catalogued events, one row per upstream event.
    events (event_id) {
        /// Upstream event identifier.
        event_id -> Int8,
        /// Display name.
        name -> Text,
        /// Free-text description.
        description -> Text,
        /// Venue.
        location -> Text,
        /// Category tag.
        category -> Text,
        /// Resolved attendee count.
        attendees -> Int4,
        /// Capacity; NULL means unlimited.
        capacity -> Nullable<Int4>,
        /// Start instant.
        begins_at -> Timestamptz,
        /// End instant.
        ends_at -> Timestamptz,
        /// Owning campuses.
        campus_ids -> Array<Int8>,
        /// Associated program tracks.
        track_ids -> Array<Int8>,
        /// Upstream creation timestamp.
        created_at -> Timestamptz,
        /// Upstream update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user notifications announcing newly catalogued events.
    notifications (user_id, event_id) {
        /// Recipient.
        user_id -> Int8,
        /// Announced event.
        event_id -> Int8,
        /// Read flag.
        read -> Bool,
        /// Creation instant.
        created_at -> Timestamptz,
        /// Soft-delete instant.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(notifications -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(campuses, campus_members, events, notifications);
