use crate::{Error, Result};

use super::{Object, ObjectNamespace, ResourceName, ResourceUid};

pub trait Resource: kube::ResourceExt<DynamicType = ()> {
    fn try_name(&self) -> Result<ResourceName> {
        self.meta()
            .name
            .as_ref()
            .ok_or_else(|| Error::MissingObjectKey(".metadata.name"))
            .map(String::to_string)
            .map(ResourceName::new)
    }

    fn try_namespace(&self) -> Result<ObjectNamespace> {
        self.meta()
            .namespace
            .as_ref()
            .ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))
            .map(String::to_string)
            .map(Into::into)
    }

    fn try_uid(&self) -> Result<ResourceUid> {
        self.meta()
            .uid
            .as_ref()
            .ok_or_else(|| Error::MissingObjectKey(".metadata.uid"))
            .map(String::to_string)
            .map(ResourceUid::new)
    }

    /// Replaces the owner references with a single controller reference to
    /// `object`, so the resource is garbage collected together with it.
    fn try_with_owner(mut self, object: &impl Object) -> Result<Self>
    where
        Self: Sized,
    {
        *self.owner_references_mut() = vec![object.try_owner_reference()?];
        Ok(self)
    }
}
