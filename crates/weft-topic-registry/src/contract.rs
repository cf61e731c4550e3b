use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use weft_shim::{
    require_args, Chaincode, ChaincodeError, HandlerResult, Response, TransactionContext,
};

use crate::record::{ClientKind, TopicRecord};

/// The topic registry contract.
///
/// Holds no state of its own: every invocation receives a fresh transaction
/// context from the host and owns nothing once it returns. Two disjoint
/// routing tables exist, one per entry point; `init` is only reachable
/// through initialization and the query/mutation functions only through
/// invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TopicRegistry;

/// Point-query reply: the stored record re-shaped with its key inlined.
#[derive(Debug, Serialize)]
struct QueryReply<'a> {
    #[serde(rename = "Key")]
    key: &'a str,
    #[serde(rename = "type")]
    kind: ClientKind,
    topic: &'a str,
}

/// One element of a history reply: the raw stored text and when the host
/// recorded it.
#[derive(Debug, Serialize)]
struct HistoryPoint {
    value: String,
    time: DateTime<Utc>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Validate the type argument, encode the record and write it at `key`.
    /// Returns the encoded text so `invoke` can echo it back.
    fn write_record(
        &self,
        ctx: &dyn TransactionContext,
        args: &[String],
    ) -> Result<String, ChaincodeError> {
        let key = &args[0];
        let kind = ClientKind::parse(&args[1]).ok_or_else(|| {
            ChaincodeError::InvalidArgument(format!("provided type {:?} is not allowed", args[1]))
        })?;
        let record = TopicRecord::new(kind, args[2].clone());
        let encoded = record.to_json()?;
        ctx.put_state(key, &encoded)?;
        debug!(key = %key, kind = %kind, topic = %record.topic, "record written");
        Ok(encoded)
    }

    fn handle_init(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 3, "init(key, type, topic)")?;
        self.write_record(ctx, args)?;
        Ok(Vec::new())
    }

    fn handle_invoke(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 3, "invoke(key, type, topic)")?;
        let written = self.write_record(ctx, args)?;
        Ok(written.into_bytes())
    }

    fn handle_delete(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "delete(key)")?;
        ctx.delete_state(&args[0])?;
        debug!(key = %args[0], "record deleted");
        Ok(Vec::new())
    }

    fn handle_query(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "query(key)")?;
        let key = &args[0];
        let stored = ctx
            .get_state(key)?
            .ok_or_else(|| ChaincodeError::KeyNotFound(key.clone()))?;
        let record = TopicRecord::from_json(&stored)?;
        let reply = QueryReply {
            key,
            kind: record.kind,
            topic: &record.topic,
        };
        let encoded =
            serde_json::to_string(&reply).map_err(|e| ChaincodeError::Internal(e.to_string()))?;
        Ok(encoded.into_bytes())
    }

    fn handle_history(&self, ctx: &dyn TransactionContext, args: &[String]) -> HandlerResult {
        require_args(args, 1, "history(key)")?;
        let mut points = Vec::new();
        // Every modification appears, delete markers included; their raw
        // value is the empty string.
        for modification in ctx.history_for_key(&args[0])? {
            let modification = modification?;
            points.push(HistoryPoint {
                value: modification.value,
                time: modification.timestamp,
            });
        }
        let encoded =
            serde_json::to_string(&points).map_err(|e| ChaincodeError::Internal(e.to_string()))?;
        Ok(encoded.into_bytes())
    }
}

impl Chaincode for TopicRegistry {
    fn init(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response {
        debug!(function = %function, argc = args.len(), "init dispatch");
        let result = match function {
            "init" => self.handle_init(ctx, args),
            _ => Err(ChaincodeError::UnknownFunction(function.to_string())),
        };
        result.into()
    }

    fn invoke(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Response {
        debug!(function = %function, argc = args.len(), "invoke dispatch");
        let result = match function {
            "invoke" => self.handle_invoke(ctx, args),
            "delete" => self.handle_delete(ctx, args),
            "query" => self.handle_query(ctx, args),
            "history" => self.handle_history(ctx, args),
            _ => Err(ChaincodeError::UnknownFunction(function.to_string())),
        };
        result.into()
    }
}
