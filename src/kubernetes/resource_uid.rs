use std::ops::Deref;

pub struct ResourceUid(String);

impl ResourceUid {
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }
}

impl Deref for ResourceUid {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
