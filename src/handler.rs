use aws_config::BehaviorVersion;
use aws_sdk_dynamodb as ddb;
use chrono::Utc;
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

use crate::config::Settings;
use crate::error::BlinkError;
use crate::frame::FrameLink;
use crate::history::{self, BlinkHistoryRecord, DdbHistoryStore, HistoryStats, HistoryStore};
use crate::link::{GeneratedLink, LinkBuilder};
use crate::metadata::{resolve_for_generation, HttpMetadataSource, TokenMetadataSource};
use crate::model::{CreateFrameReq, CreateLinkReq, CreateLinkResp, HistoryResp};
use crate::preset;
use crate::redirect::{frame_redirect, REDIRECT_ROUTE};
use crate::util::{body_bytes, epoch_millis, not_found, query_params, resp_json};

#[derive(Clone)]
pub struct Ctx<M = HttpMetadataSource, H = DdbHistoryStore> {
    pub settings: Settings,
    pub metadata: M,
    pub history: H,
}

impl Ctx {
    pub async fn new() -> Self {
        let settings = Settings::from_env();
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let history = DdbHistoryStore {
            ddb: ddb::Client::new(&config),
            table: settings.history_table.clone(),
        };
        let metadata = HttpMetadataSource::new(reqwest::Client::new(), &settings);
        Self {
            settings,
            metadata,
            history,
        }
    }
}

pub async fn router<M, H>(req: Request, ctx: &Ctx<M, H>) -> Result<Response<Body>, Error>
where
    M: TokenMetadataSource,
    H: HistoryStore,
{
    let method = req.method().as_str();
    let path = req.uri().path();

    match (method, path) {
        ("GET", REDIRECT_ROUTE) => frame_redirect(req, &ctx.settings, epoch_millis()).await,
        ("POST", "/api/links") => create_link(req, ctx).await,
        ("POST", "/api/frames") => create_frame(req, ctx).await,
        ("GET", "/api/history") => list_history(req, ctx).await,
        _ => Ok(not_found()),
    }
}

fn error_response(e: &BlinkError) -> Response<Body> {
    match e {
        BlinkError::Storage(_) | BlinkError::MetadataLookup(_) => tracing::error!("{e}"),
        _ => tracing::info!("rejected: {e}"),
    }
    resp_json(e.status(), e.body())
}

fn to_body<T: serde::Serialize>(status: u16, v: &T) -> Result<Response<Body>, Error> {
    let v = serde_json::to_value(v).map_err(|e| Error::from(format!("json: {e}")))?;
    Ok(resp_json(status, v))
}

/// Appends to the wallet's history; failures are logged and otherwise ignored.
async fn remember<H: HistoryStore>(
    store: &H,
    wallet: Option<&str>,
    platform: &str,
    link: &GeneratedLink,
) {
    let Some(address) = wallet.filter(|w| !w.is_empty()) else {
        return;
    };
    let rec = BlinkHistoryRecord::new(platform, link, Utc::now());
    if let Err(e) = history::append(store, address, rec).await {
        tracing::error!(address, "saving history: {e}");
    }
}

pub async fn chain_link<M: TokenMetadataSource>(
    settings: &Settings,
    metadata: &M,
    payload: &CreateLinkReq,
    now_millis: u64,
) -> Result<CreateLinkResp, BlinkError> {
    let preset = preset::find(&payload.chain)?;
    let req = preset.request(payload.input.as_deref(), &payload.output, now_millis)?;

    let token = match preset.metadata_chain() {
        Some(chain_id) => Some(resolve_for_generation(metadata, chain_id, &payload.output).await?),
        None => None,
    };

    Ok(CreateLinkResp {
        link: LinkBuilder::new(settings.relay_base.clone()).build(&req),
        chain: preset.id.to_string(),
        name: preset.name.to_string(),
        dex: preset.dex.to_string(),
        token,
    })
}

async fn create_link<M, H>(req: Request, ctx: &Ctx<M, H>) -> Result<Response<Body>, Error>
where
    M: TokenMetadataSource,
    H: HistoryStore,
{
    let payload: CreateLinkReq = match serde_json::from_slice(&body_bytes(&req)) {
        Ok(p) => p,
        Err(_) => return Ok(resp_json(400, json!({"error": "bad json"}))),
    };

    let out = match chain_link(&ctx.settings, &ctx.metadata, &payload, epoch_millis()).await {
        Ok(out) => out,
        Err(e) => return Ok(error_response(&e)),
    };

    remember(&ctx.history, payload.wallet.as_deref(), &out.chain, &out.link).await;
    to_body(201, &out)
}

async fn create_frame<M, H>(req: Request, ctx: &Ctx<M, H>) -> Result<Response<Body>, Error>
where
    M: TokenMetadataSource,
    H: HistoryStore,
{
    let payload: CreateFrameReq = match serde_json::from_slice(&body_bytes(&req)) {
        Ok(p) => p,
        Err(_) => return Ok(resp_json(400, json!({"error": "bad json"}))),
    };

    let frame = match FrameLink::generate(
        &ctx.settings,
        &payload.platform,
        &payload.creator,
        epoch_millis(),
    ) {
        Ok(f) => f,
        Err(e) => return Ok(error_response(&e)),
    };

    remember(&ctx.history, payload.wallet.as_deref(), frame.platform, &frame.link).await;
    to_body(201, &frame)
}

async fn list_history<M, H>(req: Request, ctx: &Ctx<M, H>) -> Result<Response<Body>, Error>
where
    M: TokenMetadataSource,
    H: HistoryStore,
{
    let params = query_params(&req);
    let Some(address) = params.get("address").filter(|a| !a.is_empty()) else {
        return Ok(error_response(&BlinkError::missing("address")));
    };

    let records = match ctx.history.load(address).await {
        Ok(r) => r,
        Err(e) => return Ok(error_response(&e)),
    };
    let stats = HistoryStats::compute(&records, Utc::now());
    to_body(200, &HistoryResp { records, stats })
}
