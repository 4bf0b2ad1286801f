use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use kube::core::ErrorResponse;

use super::{Resource, ResourceName, Store};

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: reason.into(),
        reason: reason.into(),
        code,
    })
}

/// In-memory store that records the verbs it serves and fails on demand.
pub struct FakeStore<R> {
    objects: Mutex<BTreeMap<String, R>>,
    calls: Mutex<Vec<&'static str>>,
    create_errors: Mutex<VecDeque<kube::Error>>,
    get_errors: Mutex<VecDeque<kube::Error>>,
    replace_errors: Mutex<VecDeque<kube::Error>>,
}

impl<R> Default for FakeStore<R> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            create_errors: Mutex::new(VecDeque::new()),
            get_errors: Mutex::new(VecDeque::new()),
            replace_errors: Mutex::new(VecDeque::new()),
        }
    }
}

impl<R> FakeStore<R>
where
    R: Resource + Clone,
{
    pub fn with_object(self, mut resource: R) -> Self {
        resource.meta_mut().resource_version = Some("1".into());
        self.objects
            .lock()
            .unwrap()
            .insert(resource.name_any(), resource);
        self
    }

    pub fn with_create_error(self, error: kube::Error) -> Self {
        self.create_errors.lock().unwrap().push_back(error);
        self
    }

    pub fn with_get_error(self, error: kube::Error) -> Self {
        self.get_errors.lock().unwrap().push_back(error);
        self
    }

    pub fn with_replace_errors(self, errors: impl IntoIterator<Item = kube::Error>) -> Self {
        self.replace_errors.lock().unwrap().extend(errors);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == verb)
            .count()
    }

    pub fn object(&self, name: &str) -> Option<R> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    fn record(&self, verb: &'static str) {
        self.calls.lock().unwrap().push(verb);
    }
}

impl<R> Store<R> for FakeStore<R>
where
    R: Resource + Clone + Send + Sync,
{
    async fn create(&self, resource: &R) -> Result<R, kube::Error> {
        self.record("create");
        if let Some(error) = self.create_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&resource.name_any()) {
            return Err(api_error(409, "AlreadyExists"));
        }

        let mut created = resource.clone();
        created.meta_mut().resource_version = Some("1".into());
        objects.insert(created.name_any(), created.clone());
        Ok(created)
    }

    async fn get(&self, name: &ResourceName) -> Result<R, kube::Error> {
        self.record("get");
        if let Some(error) = self.get_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        self.objects
            .lock()
            .unwrap()
            .get(name.as_ref())
            .cloned()
            .ok_or_else(|| api_error(404, "NotFound"))
    }

    async fn replace(&self, name: &ResourceName, resource: &R) -> Result<R, kube::Error> {
        self.record("replace");
        if let Some(error) = self.replace_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut objects = self.objects.lock().unwrap();
        let Some(current) = objects.get(name.as_ref()) else {
            return Err(api_error(404, "NotFound"));
        };
        if current.resource_version() != resource.resource_version() {
            return Err(api_error(409, "Conflict"));
        }

        let version = current
            .resource_version()
            .and_then(|version| version.parse::<u64>().ok())
            .unwrap_or_default();
        let mut replaced = resource.clone();
        replaced.meta_mut().resource_version = Some((version + 1).to_string());
        objects.insert(name.to_string(), replaced.clone());
        Ok(replaced)
    }
}
