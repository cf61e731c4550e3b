use serde_json::Value;
use tracing::{debug, warn};

use weft_shim::{
    require_args, Chaincode, ChaincodeError, HandlerResult, Response, TransactionContext,
};

use crate::record::{ClientRole, Registration};

/// The client registry contract.
///
/// Registers clients against topics under caller-chosen keys; the write
/// path stamps each registration with the host's transaction timestamp. On
/// top of the point and history queries of the topic registry this contract
/// also exercises the host's rich-query capability through
/// `queryByProperty`.
///
/// Role arguments are matched ignoring case. An unrecognized role is
/// rejected by default; [`with_legacy_role_fallback`] restores the
/// historical behavior of degrading it to `Subscriber`.
///
/// [`with_legacy_role_fallback`]: ClientRegistry::with_legacy_role_fallback
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientRegistry {
    legacy_role_fallback: bool,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            legacy_role_fallback: false,
        }
    }

    /// Degrade unrecognized role arguments to `Subscriber` instead of
    /// rejecting them, logging each degradation at warn level. Kept only
    /// for compatibility with deployments that relied on the old silent
    /// fallback.
    pub fn with_legacy_role_fallback(mut self) -> Self {
        self.legacy_role_fallback = true;
        self
    }

    fn parse_role(&self, text: &str) -> Result<ClientRole, ChaincodeError> {
        match ClientRole::parse(text) {
            Some(role) => Ok(role),
            None if self.legacy_role_fallback => {
                warn!(role = %text, "unrecognized client role degraded to Subscriber");
                Ok(ClientRole::Subscriber)
            }
            None => Err(ChaincodeError::InvalidArgument(format!(
                "provided client role {text:?} is not allowed"
            ))),
        }
    }

    /// Shared write path for `init` and `invoke`. The key doubles as the
    /// client id; the registration time is the transaction timestamp.
    fn handle_register(
        &self,
        ctx: &dyn TransactionContext,
        args: &[String],
        usage: &'static str,
    ) -> HandlerResult {
        require_args(args, 3, usage)?;
        let key = &args[0];
        let role = self.parse_role(&args[1])?;
        let registration = Registration::new(args[2].clone(), key.clone(), role, ctx.tx_timestamp()?);
        ctx.put_state(key, &registration.to_json()?)?;
        debug!(key = %key, role = %role, topic = %registration.topic, "client registered");
        Ok(Vec::new())
    }

    fn handle_delete(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "delete(key)")?;
        ctx.delete_state(&args[0])?;
        debug!(key = %args[0], "registration deleted");
        Ok(Vec::new())
    }

    fn handle_query(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "query(key)")?;
        let key = &args[0];
        let stored = ctx
            .get_state(key)?
            .ok_or_else(|| ChaincodeError::KeyNotFound(key.clone()))?;
        // The stored text is already the record's canonical encoding.
        Ok(stored.into_bytes())
    }

    fn handle_history(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "history(key)")?;
        let mut records = Vec::new();
        // Delete markers carry no record text and are skipped; every other
        // version is decoded and re-encoded so corrupt history fails loudly.
        for modification in ctx.history_for_key(&args[0])? {
            let modification = modification?;
            if modification.is_delete {
                continue;
            }
            records.push(Registration::from_json(&modification.value)?);
        }
        let encoded =
            serde_json::to_string(&records).map_err(|e| ChaincodeError::Internal(e.to_string()))?;
        Ok(encoded.into_bytes())
    }

    fn handle_query_by_property(
        &self,
        ctx: &dyn TransactionContext,
        args: &[String],
    ) -> HandlerResult {
        require_args(args, 2, "queryByProperty(property, value)")?;
        let mut equality = serde_json::Map::new();
        equality.insert(args[0].clone(), Value::String(args[1].clone()));
        let selector = serde_json::json!({ "selector": equality }).to_string();
        debug!(selector = %selector, "rich query");

        let mut records = Vec::new();
        for result in ctx.query_result(&selector)? {
            let hit = result?;
            records.push(Registration::from_json(&hit.value)?);
        }
        let encoded =
            serde_json::to_string(&records).map_err(|e| ChaincodeError::Internal(e.to_string()))?;
        Ok(encoded.into_bytes())
    }
}

impl Chaincode for ClientRegistry {
    fn init(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response {
        debug!(function = %function, argc = args.len(), "init dispatch");
        let result = match function {
            "init" => self.handle_register(ctx, args, "init(key, role, topic)"),
            _ => Err(ChaincodeError::UnknownFunction(function.to_string())),
        };
        result.into()
    }

    fn invoke(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response {
        debug!(function = %function, argc = args.len(), "invoke dispatch");
        let result = match function {
            "invoke" => self.handle_register(ctx, args, "invoke(key, role, topic)"),
            "delete" => self.handle_delete(ctx, args),
            "query" => self.handle_query(ctx, args),
            "history" => self.handle_history(ctx, args),
            "queryByProperty" => self.handle_query_by_property(ctx, args),
            _ => Err(ChaincodeError::UnknownFunction(function.to_string())),
        };
        result.into()
    }
}
