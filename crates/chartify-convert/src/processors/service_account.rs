//! ServiceAccount processor
//!
//! Pull secrets become a values block, as they do in pod specs; mountable
//! secrets stay templated references.

use chartify_core::{AppMetadata, Manifest, Template};
use k8s_openapi::api::core::v1::ServiceAccount;

use crate::error::Result;
use crate::fields;
use crate::processor::{Processor, TemplateBuilder, decode, encode};

pub struct ServiceAccountProcessor;

impl Processor for ServiceAccountProcessor {
    fn name(&self) -> &'static str {
        "service_account"
    }

    fn applies(&self, obj: &Manifest) -> bool {
        obj.gvk().matches("", "v1", "ServiceAccount")
    }

    fn template(&self, app: &AppMetadata, obj: &Manifest) -> Result<Template> {
        let account: ServiceAccount = decode(obj, "ServiceAccount")?;
        let mut builder = TemplateBuilder::new(app, obj)?;

        if let Some(automount) = account.automount_service_account_token {
            builder.field("automountServiceAccountToken", automount.into());
        }

        if let Some(secrets) = account.image_pull_secrets.as_ref().filter(|s| !s.is_empty()) {
            let secrets = encode(obj, secrets)?;
            let block = builder.add_block("", "imagePullSecrets", secrets)?;
            builder.field("imagePullSecrets", block.to_json());
        }

        let mut secrets = encode(obj, &account.secrets)?;
        for i in 0..fields::len_at(&secrets, "") {
            fields::reference(app, &mut secrets, &format!("/{i}/name"));
        }
        builder.field("secrets", secrets);

        builder.finish()
    }
}
