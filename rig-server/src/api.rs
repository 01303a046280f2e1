//! HTTP control API
//!
//! JSON endpoints under `/api` over the shared [`Rig`] handle. Every
//! response carries a `success` flag; failed operations come back as
//! HTTP 400 with an `error` string and leave the radio state untouched.

use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::middleware::DefaultHeaders;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer};
use rig_core::{Control, Rig, RigError, Vfo};
use rig_protocol::Mode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

fn ok(mut payload: Map<String, Value>) -> HttpResponse {
    payload.insert("success".to_string(), Value::Bool(true));
    HttpResponse::Ok().json(Value::Object(payload))
}

fn error_body(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

fn bad_request(err: &RigError) -> HttpResponse {
    HttpResponse::BadRequest().json(error_body(&err.to_string()))
}

/// Coerce a JSON value to an enable flag
///
/// Accepts booleans, 0/1, and the usual string spellings; anything else
/// is rejected rather than guessed at.
fn coerce_bool(value: &Value) -> Result<bool, RigError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(RigError::InvalidBoolean(n.to_string())),
        },
        Value::String(s) => match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(RigError::InvalidBoolean(s.clone())),
        },
        other => Err(RigError::InvalidBoolean(other.to_string())),
    }
}

/// Coerce a JSON value to a control setting, truncating toward zero
fn coerce_int(name: &str, value: &Value) -> Result<i64, RigError> {
    let reject = || RigError::InvalidControlValue {
        name: name.to_string(),
        reason: format!("not an integer: {}", value),
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(reject),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| reject()),
        _ => Err(reject()),
    }
}

fn parse_vfo(raw: Option<&str>) -> Result<Vfo, RigError> {
    raw.unwrap_or("A").parse()
}

#[get("/status")]
async fn get_status(rig: web::Data<Rig>) -> HttpResponse {
    match serde_json::to_value(rig.snapshot()) {
        Ok(Value::Object(map)) => ok(map),
        _ => HttpResponse::InternalServerError().json(error_body("snapshot serialization failed")),
    }
}

#[get("/frequency")]
async fn get_frequency(rig: web::Data<Rig>) -> HttpResponse {
    let snap = rig.snapshot();
    let frequency = if snap.active_vfo == "B" {
        snap.frequency_b
    } else {
        snap.frequency_a
    };
    ok(Map::from_iter([
        ("frequency".to_string(), json!(frequency)),
        ("vfo".to_string(), json!(snap.active_vfo)),
    ]))
}

#[derive(Deserialize)]
struct FrequencyBody {
    frequency: Value,
    vfo: Option<String>,
}

#[post("/frequency")]
async fn post_frequency(rig: web::Data<Rig>, body: web::Json<FrequencyBody>) -> HttpResponse {
    let vfo = match parse_vfo(body.vfo.as_deref()) {
        Ok(v) => v,
        Err(e) => return bad_request(&e),
    };
    let result = match &body.frequency {
        Value::String(raw) => rig.set_frequency(vfo, raw),
        Value::Number(n) => match n.as_f64() {
            Some(mhz) => rig.set_frequency_mhz(vfo, mhz),
            None => Err(RigError::InvalidFrequency(n.to_string())),
        },
        other => Err(RigError::InvalidFrequency(other.to_string())),
    };
    match result {
        Ok(freq) => ok(Map::from_iter([
            ("frequency".to_string(), json!(freq.display())),
            ("vfo".to_string(), json!(vfo.as_str())),
        ])),
        Err(e) => bad_request(&e),
    }
}

#[get("/mode")]
async fn get_mode(rig: web::Data<Rig>) -> HttpResponse {
    let snap = rig.snapshot();
    let mode = if snap.active_vfo == "B" {
        snap.mode_b
    } else {
        snap.mode_a
    };
    ok(Map::from_iter([
        ("mode".to_string(), json!(mode)),
        ("vfo".to_string(), json!(snap.active_vfo)),
    ]))
}

#[derive(Deserialize)]
struct ModeBody {
    mode: String,
    vfo: Option<String>,
}

#[post("/mode")]
async fn post_mode(rig: web::Data<Rig>, body: web::Json<ModeBody>) -> HttpResponse {
    let vfo = match parse_vfo(body.vfo.as_deref()) {
        Ok(v) => v,
        Err(e) => return bad_request(&e),
    };
    let mode = match body.mode.parse::<Mode>() {
        Ok(m) => m,
        Err(e) => return bad_request(&e.into()),
    };
    rig.set_mode(vfo, mode);
    ok(Map::from_iter([
        ("mode".to_string(), json!(mode.as_str())),
        ("vfo".to_string(), json!(vfo.as_str())),
    ]))
}

#[get("/vfo")]
async fn get_vfo(rig: web::Data<Rig>) -> HttpResponse {
    ok(Map::from_iter([(
        "active_vfo".to_string(),
        json!(rig.snapshot().active_vfo),
    )]))
}

#[derive(Deserialize)]
struct VfoBody {
    vfo: String,
}

#[post("/vfo")]
async fn post_vfo(rig: web::Data<Rig>, body: web::Json<VfoBody>) -> HttpResponse {
    match body.vfo.parse::<Vfo>() {
        Ok(vfo) => {
            rig.set_active_vfo(vfo);
            ok(Map::from_iter([(
                "active_vfo".to_string(),
                json!(vfo.as_str()),
            )]))
        }
        Err(e) => bad_request(&e),
    }
}

#[get("/split")]
async fn get_split(rig: web::Data<Rig>) -> HttpResponse {
    ok(Map::from_iter([(
        "split_enabled".to_string(),
        json!(rig.snapshot().split_enabled),
    )]))
}

/// Pull an optional `enable` flag out of a request body
///
/// An empty body (or a body without the field) means "toggle"; a present
/// but unreadable body is still a 400.
fn parse_enable(body: &web::Bytes) -> Result<Option<bool>, HttpResponse> {
    if body.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| HttpResponse::BadRequest().json(error_body(&e.to_string())))?;
    match value.get("enable") {
        Some(flag) => coerce_bool(flag).map(Some).map_err(|e| bad_request(&e)),
        None => Ok(None),
    }
}

#[post("/split")]
async fn post_split(rig: web::Data<Rig>, body: web::Bytes) -> HttpResponse {
    let enabled = match parse_enable(&body) {
        Ok(Some(enable)) => {
            rig.set_split(enable);
            enable
        }
        Ok(None) => rig.toggle_split(),
        Err(resp) => return resp,
    };
    ok(Map::from_iter([(
        "split_enabled".to_string(),
        json!(enabled),
    )]))
}

#[post("/transmit")]
async fn post_transmit(rig: web::Data<Rig>, body: web::Bytes) -> HttpResponse {
    let transmitting = match parse_enable(&body) {
        Ok(Some(enable)) => {
            rig.set_transmitting(enable);
            enable
        }
        Ok(None) => rig.toggle_transmitting(),
        Err(resp) => return resp,
    };
    ok(Map::from_iter([(
        "transmitting".to_string(),
        json!(transmitting),
    )]))
}

#[get("/controls")]
async fn get_controls(rig: web::Data<Rig>) -> HttpResponse {
    let snap = rig.snapshot();
    ok(Map::from_iter([
        ("af_gain".to_string(), json!(snap.af_gain)),
        ("sub_af_gain".to_string(), json!(snap.sub_af_gain)),
        ("rf_gain".to_string(), json!(snap.rf_gain)),
        ("power_level".to_string(), json!(snap.power_level)),
        ("shift".to_string(), json!(snap.shift)),
        ("width".to_string(), json!(snap.width)),
        ("notch".to_string(), json!(snap.notch)),
    ]))
}

/// Bulk control update: validate every entry first, apply only if all pass
#[post("/controls")]
async fn post_controls(rig: web::Data<Rig>, body: web::Json<Value>) -> HttpResponse {
    let Some(fields) = body.as_object() else {
        return HttpResponse::BadRequest().json(error_body("expected a JSON object"));
    };

    let mut updates = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let Some(control) = Control::from_name(name) else {
            return HttpResponse::BadRequest()
                .json(error_body(&format!("unknown control: {}", name)));
        };
        let raw = match coerce_int(name, value) {
            Ok(v) => v,
            Err(e) => return bad_request(&e),
        };
        if !(0..=100).contains(&raw) {
            return bad_request(&RigError::InvalidControlValue {
                name: name.clone(),
                reason: format!("{} outside 0-100", raw),
            });
        }
        updates.push((control, raw));
    }

    let mut updated = Map::new();
    for (control, raw) in updates {
        match rig.set_control(control, raw) {
            Ok(applied) => {
                updated.insert(control.name().to_string(), json!(applied));
            }
            Err(e) => return bad_request(&e),
        }
    }
    ok(Map::from_iter([(
        "updated".to_string(),
        Value::Object(updated),
    )]))
}

#[get("/memory/{index}")]
async fn get_memory(rig: web::Data<Rig>, path: web::Path<i64>) -> HttpResponse {
    let index = path.into_inner();
    let channel = match usize::try_from(index)
        .map_err(|_| RigError::InvalidChannelIndex(index))
        .and_then(|i| rig.memory_channel(i))
    {
        Ok(c) => c,
        Err(e) => return bad_request(&e),
    };
    let memory = match serde_json::to_value(channel.snapshot()) {
        Ok(v) => v,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(error_body("channel serialization failed"))
        }
    };
    ok(Map::from_iter([
        ("channel".to_string(), json!(index)),
        ("memory".to_string(), memory),
    ]))
}

#[post("/memory/{index}/store")]
async fn post_memory_store(rig: web::Data<Rig>, path: web::Path<i64>) -> HttpResponse {
    let index = path.into_inner();
    let result = usize::try_from(index)
        .map_err(|_| RigError::InvalidChannelIndex(index))
        .and_then(|i| rig.store_memory(i));
    match result {
        Ok(()) => {
            info!("stored current state to memory channel {}", index);
            ok(Map::from_iter([(
                "message".to_string(),
                json!(format!("stored to memory channel {}", index)),
            )]))
        }
        Err(e) => bad_request(&e),
    }
}

#[put("/memory/{index}")]
async fn put_memory_recall(rig: web::Data<Rig>, path: web::Path<i64>) -> HttpResponse {
    let index = path.into_inner();
    let result = usize::try_from(index)
        .map_err(|_| RigError::InvalidChannelIndex(index))
        .and_then(|i| rig.recall_memory(i));
    match result {
        Ok(channel) => {
            info!("recalled memory channel {}", index);
            ok(Map::from_iter([
                ("channel".to_string(), json!(index)),
                ("frequency".to_string(), json!(channel.freq_a.display())),
                ("mode".to_string(), json!(channel.mode_a.as_str())),
            ]))
        }
        Err(e) => bad_request(&e),
    }
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(error_body("not found"))
}

/// Register every API route on a service config
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_status)
            .service(get_frequency)
            .service(post_frequency)
            .service(get_mode)
            .service(post_mode)
            .service(get_vfo)
            .service(post_vfo)
            .service(get_split)
            .service(post_split)
            .service(post_transmit)
            .service(get_controls)
            .service(post_controls)
            .service(get_memory)
            .service(post_memory_store)
            .service(put_memory_recall),
    )
    .default_service(web::route().to(not_found));
}

/// Malformed request bodies come back in the same envelope as rig errors
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = error_body(&err.to_string());
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::build(StatusCode::BAD_REQUEST).json(body),
        )
        .into()
    })
}

/// Build the HTTP server; the caller spawns it and keeps the handle
pub fn build_server(rig: Rig, host: &str, port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(rig.clone()))
            .app_data(json_config())
            .wrap(DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
            .configure(configure)
    })
    .disable_signals()
    .shutdown_timeout(2)
    .bind((host, port))?
    .run();
    info!("control API listening on {}:{}", host, port);
    Ok(server)
}
