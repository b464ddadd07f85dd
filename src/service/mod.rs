//! Operations behind the HTTP routes.
//!
//! Each operation takes the [`RequestContext`](crate::store::RequestContext)
//! of the request and a typed request body, validates it, checks
//! authorization and drives the stores.

pub mod entries;
pub mod teams;
pub mod users;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::models::{CredentialsRequest, User};
    use crate::render::MarkdownRenderer;
    use crate::store::memory::MemoryStore;
    use crate::store::{RequestContext, Stores};

    use super::users;

    /// Services wired to a fresh in-memory store.
    pub struct Fixture {
        pub store: Arc<MemoryStore>,
        pub stores: Stores,
    }

    impl Fixture {
        pub fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let stores = Stores::from_shared(store.clone(), Arc::new(MarkdownRenderer));
            Self { store, stores }
        }

        pub fn anonymous(&self) -> RequestContext {
            RequestContext::anonymous(self.stores.clone())
        }

        /// Register `username` and return the stored user.
        pub async fn register(&self, username: &str) -> User {
            users::register(
                &self.anonymous(),
                CredentialsRequest {
                    username: username.to_string(),
                    password: "secret".to_string(),
                },
            )
            .await
            .unwrap();
            self.stores.users.find_by_username(username).await.unwrap()
        }

        /// A context for `username` with their current memberships loaded.
        pub async fn as_user(&self, username: &str) -> RequestContext {
            let user = self.stores.users.find_by_username(username).await.unwrap();
            let user = users::with_memberships(&self.stores, user).await.unwrap();
            RequestContext::new(Some(user), self.stores.clone())
        }

        pub async fn make_moderator(&self, username: &str) {
            let mut user = self.stores.users.find_by_username(username).await.unwrap();
            user.moderator = true;
            self.stores.users.update(&user).await.unwrap();
        }
    }
}
