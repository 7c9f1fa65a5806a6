use super::cached;
use crate::api::settings::{self as api, AppSettings, SettingUpdate, SetupStatus};
use crate::error::ClientError;
use crate::query::{KeyFilter, Mutation, QueryClient};

pub mod keys {
    use crate::query::QueryKey;

    pub fn settings() -> QueryKey {
        QueryKey::new(["settings"])
    }

    pub fn setup() -> QueryKey {
        QueryKey::new(["setup"])
    }
}

pub async fn app_settings(client: &QueryClient) -> Result<AppSettings, ClientError> {
    cached(client, keys::settings(), || api::get_app_settings(client.invoker())).await
}

pub async fn setup_status(client: &QueryClient) -> Result<SetupStatus, ClientError> {
    cached(client, keys::setup(), || api::check_setup_status(client.invoker())).await
}

pub async fn update_settings(client: &QueryClient, updates: &[SettingUpdate]) -> Result<(), ClientError> {
    Mutation::new("update_settings")
        .invalidates(KeyFilter::prefix(["settings"]))
        .run(client, api::update_settings(client.invoker(), updates))
        .await
}
