//! Mapping helpers between upstream shapes, catalogue records, and domain errors.

use crate::domain::Error;
use crate::domain::ports::{CampusRepositoryError, CredentialError, UpstreamEvent};
use crate::domain::CatalogueEvent;

/// Build the catalogue record for `upstream` with a resolved attendee count.
pub(super) fn catalogue_event(upstream: &UpstreamEvent, attendees: u32) -> CatalogueEvent {
    CatalogueEvent {
        id: upstream.id,
        name: upstream.name.clone(),
        description: upstream.description.clone(),
        location: upstream.location.clone(),
        category: upstream.kind.clone(),
        attendees,
        capacity: upstream.max_people,
        begins_at: upstream.begin_at,
        ends_at: upstream.end_at,
        campus_ids: upstream.campus_ids.clone(),
        track_ids: upstream.cursus_ids.clone(),
        created_at: upstream.created_at,
        updated_at: upstream.updated_at,
    }
}

pub(super) fn map_credential_error(error: CredentialError) -> Error {
    match error {
        CredentialError::Rejected { message } => Error::unauthorized(format!(
            "intranet rejected the service credentials: {message}"
        )),
        CredentialError::Transport { message } | CredentialError::Decode { message } => {
            Error::service_unavailable(format!("service credential unavailable: {message}"))
        }
    }
}

pub(super) fn map_campus_listing_error(error: CampusRepositoryError) -> Error {
    match error {
        CampusRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("campus listing unavailable: {message}"))
        }
        CampusRepositoryError::Query { message } => {
            Error::internal(format!("campus listing failed: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage.

    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case::rejected(CredentialError::rejected("invalid_client"), ErrorCode::Unauthorized)]
    #[case::transport(CredentialError::transport("reset"), ErrorCode::ServiceUnavailable)]
    #[case::decode(CredentialError::decode("no token"), ErrorCode::ServiceUnavailable)]
    fn credential_errors_map_to_codes(#[case] error: CredentialError, #[case] code: ErrorCode) {
        assert_eq!(map_credential_error(error).code(), code);
    }

    #[rstest]
    #[case::connection(CampusRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case::query(CampusRepositoryError::query("bad row"), ErrorCode::InternalError)]
    fn campus_listing_errors_map_to_codes(
        #[case] error: CampusRepositoryError,
        #[case] code: ErrorCode,
    ) {
        assert_eq!(map_campus_listing_error(error).code(), code);
    }
}
