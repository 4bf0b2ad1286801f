use super::ResourceName;

/// Create, read and replace access to the resources of a single kind within
/// a single namespace.
pub trait Store<R> {
    fn create(&self, resource: &R) -> impl Future<Output = Result<R, kube::Error>> + Send;

    fn get(&self, name: &ResourceName) -> impl Future<Output = Result<R, kube::Error>> + Send;

    /// Writes `resource` back, failing with a conflict if its
    /// `.metadata.resourceVersion` is stale.
    fn replace(
        &self,
        name: &ResourceName,
        resource: &R,
    ) -> impl Future<Output = Result<R, kube::Error>> + Send;
}

#[must_use]
pub fn is_already_exists(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409 && response.reason == "AlreadyExists")
}

#[must_use]
pub fn is_conflict(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409 && response.reason == "Conflict")
}

#[cfg(test)]
mod tests {
    use crate::kubernetes::fake_store::api_error;

    use super::{is_already_exists, is_conflict};

    #[test]
    fn already_exists_is_not_a_conflict() {
        // arrange
        let error = api_error(409, "AlreadyExists");

        // act & assert
        assert!(is_already_exists(&error));
        assert!(!is_conflict(&error));
    }

    #[test]
    fn conflict_is_not_already_exists() {
        // arrange
        let error = api_error(409, "Conflict");

        // act & assert
        assert!(is_conflict(&error));
        assert!(!is_already_exists(&error));
    }

    #[test]
    fn other_status_codes_are_neither() {
        // arrange
        let error = api_error(500, "InternalError");

        // act & assert
        assert!(!is_conflict(&error));
        assert!(!is_already_exists(&error));
    }
}
