//! AI assistant bridge.
//!
//! `POST /api/chat` templates the latest resolved values into a prompt and
//! forwards it to a configurable OpenAI-style chat-completions endpoint. The
//! bridge is a read-only consumer: it sees the same per-region resolution the
//! map does, with no period filter.

use std::fmt::Write as _;

use axum::{Json, extract::State};
use mapstat_core::{resolve::resolve_regions, store::ValueStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

const SYSTEM_PROMPT: &str = "\
Ти — Aura, інтелектуальна асистентка для веб-додатку \"Інтерактивна Карта України\".
Твоя мета: допомагати користувачам аналізувати дані на карті, пояснювати статистику регіонів та відповідати на питання про Україну.

Твій стиль:
- Дружній, професійний, лаконічний.
- Спілкуйся українською мовою.
- Якщо ти не маєш конкретних даних про певний регіон прямо зараз — відповідай загальну інформацію або спрямовуй користувача на вибір відповідної метрики в меню.";

const NO_UPSTREAM_REPLY: &str =
  "Я Aura! Вибачте, але AI-асистент ще не налаштований на цьому сервері.";

const CONTEXT_UNAVAILABLE: &str = "Дані з бази тимчасово недоступні.";

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub message: String,
}

/// `POST /api/chat` — body `{"message": "..."}`, response `{"response": "..."}`.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ChatBody>,
) -> Result<Json<Value>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let Some(upstream) = state.config.chat_upstream_url.clone() else {
    return Ok(Json(json!({ "response": NO_UPSTREAM_REPLY })));
  };

  let context = match build_context(state.store.as_ref()).await {
    Ok(text) => text,
    Err(e) => {
      tracing::error!(error = %e, "chat context fetch failed");
      CONTEXT_UNAVAILABLE.to_owned()
    }
  };

  let prompt = format!(
    "{SYSTEM_PROMPT}\n\nКОНТЕКСТ З БАЗИ ДАНИХ:\n{context}\n\nКОРИСТУВАЧ ЗАПИТУЄ: {}\n\n\
     Відповідай на основі наданого контексту. Якщо даних немає, чесно про це скажи.",
    body.message
  );

  let model = state
    .config
    .chat_model
    .clone()
    .unwrap_or_else(|| "gpt-4o-mini".to_owned());

  let mut request = state.http.post(&upstream).json(&json!({
    "model": model,
    "messages": [{ "role": "user", "content": prompt }],
  }));
  if let Some(key) = &state.config.chat_api_key {
    request = request.bearer_auth(key);
  }

  let response = request
    .send()
    .await
    .map_err(|e| ApiError::Upstream(e.to_string()))?;
  let payload: Value = response
    .json()
    .await
    .map_err(|e| ApiError::Upstream(e.to_string()))?;

  let text = payload["choices"][0]["message"]["content"]
    .as_str()
    .unwrap_or_default()
    .to_owned();

  Ok(Json(json!({ "response": text })))
}

/// Render the latest effective value per (active layer, region) as a prompt
/// context block. Regions with no data for a layer are left out.
async fn build_context<S: ValueStore>(store: &S) -> Result<String, S::Error> {
  let layers = store.list_layers(true).await?;
  let regions = store.list_regions().await?;
  let raions = store.list_raions().await?;

  let mut context = String::from("Ось найактуальніші дані з бази даних:\n");
  for layer in &layers {
    let region_values = store.region_values(layer.id, None).await?;
    let raion_values = store.raion_values(layer.id, None).await?;
    let resolved =
      resolve_regions(&regions, &raions, &region_values, &raion_values, layer);
    for row in resolved {
      if let Some(period) = row.period {
        let _ = writeln!(
          context,
          "- {} у регіоні \"{}\": {} {} (станом на {}).",
          layer.name, row.region, row.value, row.suffix, period
        );
      }
    }
  }
  Ok(context)
}
