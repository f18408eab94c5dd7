//! The per-request pipeline: normalize, item phase, pair phase, single
//! phase, triple phase, assembly.
//!
//! Provider faults are isolated per call and never fail the request; cache
//! faults on the item and pair stores are surfaced only after the response
//! has been computed. The usage-log write is fire-and-forget.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use rusqlite::Connection;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{self, Settings, CALC_VERSION};
use crate::db::{self, item_cache, pair_cache, usage_log, DatabaseError};
use crate::db::item_cache::ItemEntry;
use crate::evidence::standardize;
use crate::evidence::EvidenceRecord;
use crate::limiter::TaskLimiter;
use crate::net::UpstreamClient;
use crate::normalize::{
    self, dedupe_by_normalized, enumerate_pairs, enumerate_triples, normalize_items, pair_key,
    InputError, NormalizedItem,
};
use crate::providers::literature::{EvidenceDigest, LiteratureClient};
use crate::providers::{adverse, exposure, label, rxnorm, supplement};
use crate::providers::{ExposureData, LabelData};
use crate::report::{
    AnalysisResponse, AnalysisResults, CacheStats, DebugInfo, MetaInfo, PairReport, Timing,
};

use super::assemble;
use super::trace::StatusRecorder;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(#[from] InputError),
    #[error("Cache store failure: {0}")]
    Cache(#[from] DatabaseError),
}

/// Request options, all defaulting to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    pub include_ai: bool,
    pub include_cms: bool,
    pub debug: bool,
    pub force_refresh: bool,
}

/// The analysis engine: owns the cache connection, the upstream HTTP
/// client, and the two limiters. One instance serves all requests.
pub struct AnalysisEngine {
    settings: Settings,
    db: Arc<Mutex<Connection>>,
    http: UpstreamClient,
    literature: LiteratureClient,
    upstream: TaskLimiter,
    pair_tasks: TaskLimiter,
}

/// Composite item-phase result for one canonical item.
#[derive(Debug, Clone)]
struct ItemInfo {
    item: NormalizedItem,
    rxcui: Option<String>,
    supplement_cui: Option<String>,
    label: Option<LabelData>,
    exposure: Option<ExposureData>,
}

/// Mutable per-request state shared across phases.
struct RequestCx {
    options: AnalyzeOptions,
    trace: StatusRecorder,
    stats: Mutex<CacheStats>,
    cache_failure: Mutex<Option<DatabaseError>>,
    rxcui_resolutions: Mutex<BTreeMap<String, String>>,
}

impl RequestCx {
    fn new(options: AnalyzeOptions) -> Self {
        Self {
            options,
            trace: StatusRecorder::new(),
            stats: Mutex::new(CacheStats::default()),
            cache_failure: Mutex::new(None),
            rxcui_resolutions: Mutex::new(BTreeMap::new()),
        }
    }

    fn bump_stats(&self, f: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            f(&mut stats);
        }
    }

    fn record_cache_failure(&self, error: DatabaseError) {
        tracing::error!(error = %error, "cache store failure");
        if let Ok(mut slot) = self.cache_failure.lock() {
            slot.get_or_insert(error);
        }
    }

    fn take_cache_failure(&self) -> Option<DatabaseError> {
        self.cache_failure.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Outcome of one provider fan-out leg within a pair.
struct CallOutcome {
    records: Vec<EvidenceRecord>,
    attempted: bool,
    clean: bool,
}

impl CallOutcome {
    fn skipped() -> Self {
        Self {
            records: Vec::new(),
            attempted: false,
            clean: false,
        }
    }
}

impl AnalysisEngine {
    pub fn new(settings: Settings, conn: Connection) -> Self {
        let literature = LiteratureClient::new(
            &settings.literature_endpoint,
            settings.literature_api_key.clone(),
            &settings.literature_model,
        );
        Self {
            settings,
            db: Arc::new(Mutex::new(conn)),
            http: UpstreamClient::new(),
            literature,
            upstream: TaskLimiter::new(config::UPSTREAM_CONCURRENCY),
            pair_tasks: TaskLimiter::new(config::PAIR_CONCURRENCY),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Count of usage-log entries, for the health endpoint.
    pub fn usage_entries(&self) -> Option<i64> {
        self.with_conn(usage_log::entry_count).ok()
    }

    /// Run the full pipeline for one request.
    pub async fn analyze(
        &self,
        values: Vec<String>,
        options: AnalyzeOptions,
    ) -> Result<AnalysisResponse, PipelineError> {
        let started = Instant::now();
        let items = normalize_items(&values)?;
        let unique = dedupe_by_normalized(&items);
        let pairs = enumerate_pairs(&unique);
        let triples = enumerate_triples(&unique);
        let cx = RequestCx::new(options);

        // Item phase. The pair phase must not start until every item has
        // resolved, so the phases are sequential awaits.
        let lookup_started = Instant::now();
        let infos = join_all(
            unique
                .iter()
                .map(|item| self.upstream.run(self.resolve_item(item, &cx))),
        )
        .await;
        let item_map: HashMap<String, ItemInfo> = infos
            .into_iter()
            .map(|info| (info.item.normalized.clone(), info))
            .collect();
        let lookup_ms = lookup_started.elapsed().as_millis() as u64;

        // Pair phase.
        let pair_started = Instant::now();
        let keyed_pairs: Vec<(String, PairReport)> = join_all(pairs.iter().map(|(a, b)| {
            self.pair_tasks
                .run(self.process_pair(a, b, &item_map, &cx))
        }))
        .await;
        let pair_processing_ms = pair_started.elapsed().as_millis() as u64;

        // Single phase.
        let singles = join_all(
            unique
                .iter()
                .map(|item| self.build_single(item, &item_map, &cx)),
        )
        .await;

        // Triple phase: derived entirely from the pair reports.
        let triple_started = Instant::now();
        let pairs_by_key: HashMap<String, PairReport> = keyed_pairs.iter().cloned().collect();
        let triple_reports: Vec<_> = triples
            .iter()
            .map(|(a, b, c)| assemble::assemble_triple_report(a, b, c, &pairs_by_key))
            .collect();
        let triple_processing_ms = triple_started.elapsed().as_millis() as u64;

        // Assembly.
        let cache_stats = self.snapshot_stats(&cx);
        let debug_enabled = options.debug || self.settings.debug_default;
        let rxcui_resolutions = cx
            .rxcui_resolutions
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default();
        let response = AnalysisResponse {
            items,
            results: AnalysisResults {
                singles,
                pairs: keyed_pairs.into_iter().map(|(_, report)| report).collect(),
                triples: triple_reports,
            },
            meta: MetaInfo {
                calc_version: CALC_VERSION.to_string(),
                cache_stats,
                timing: Timing {
                    total_ms: started.elapsed().as_millis() as u64,
                    lookup_ms,
                    pair_processing_ms,
                    triple_processing_ms,
                },
            },
            debug: debug_enabled.then(|| DebugInfo {
                provider_statuses: cx.trace.snapshot(),
                rxcui_resolutions: (!rxcui_resolutions.is_empty()).then_some(rxcui_resolutions),
            }),
        };

        self.write_usage(&response, started.elapsed().as_millis() as i64);

        // Item/pair store failures surface only after the response exists.
        if let Some(error) = cx.take_cache_failure() {
            return Err(error.into());
        }
        Ok(response)
    }

    // ── Item phase ──────────────────────────────────────────

    async fn resolve_item(&self, item: &NormalizedItem, cx: &RequestCx) -> ItemInfo {
        let name = item.normalized.clone();
        let now = Utc::now();

        let cached = if cx.options.force_refresh {
            None
        } else {
            match self.with_conn(|conn| item_cache::get_item(conn, &name)) {
                Ok(entry) => entry,
                Err(error) => {
                    cx.record_cache_failure(error);
                    None
                }
            }
        };

        let entry = match cached {
            Some(entry) => {
                cx.bump_stats(|s| s.med_lookup_hits += 1);
                self.refresh_cached_item(entry, cx, &name).await
            }
            None => {
                cx.bump_stats(|s| s.med_lookup_misses += 1);
                self.fetch_item(&name, cx, now).await
            }
        };

        if let Some(cui) = &entry.rxcui {
            if let Ok(mut map) = cx.rxcui_resolutions.lock() {
                map.insert(name.clone(), cui.clone());
            }
        }

        let exposure = if cx.options.include_cms {
            self.resolve_exposure(&name, cx).await
        } else {
            None
        };

        ItemInfo {
            item: item.clone(),
            rxcui: entry.rxcui,
            supplement_cui: entry.supplement_cui,
            label: entry.label,
            exposure,
        }
    }

    /// On a cache hit every subsumed provider reports a cached status, then
    /// stale negative identifier fields are re-fetched individually.
    async fn refresh_cached_item(
        &self,
        mut entry: ItemEntry,
        cx: &RequestCx,
        name: &str,
    ) -> ItemEntry {
        let now = Utc::now();
        cx.trace
            .record_cached(format!("rxnorm_lookup:{name}"), entry.rxcui.is_some());
        cx.trace.record_cached(
            format!("supplement_lookup:{name}"),
            entry.supplement_cui.is_some(),
        );
        // Label absence is a clean "looked, found nothing".
        cx.trace.record_cached(format!("label_warnings:{name}"), true);

        let stale = entry.stale_negative_fields(now);
        if !stale.any() {
            return entry;
        }

        let mut refreshed_clean = true;
        if stale.rxcui {
            let reply = rxnorm::lookup_rxcui(&self.http, name).await;
            cx.trace.record_lookup(format!("rxnorm_lookup:{name}"), &reply);
            refreshed_clean &= reply.completed_clean();
            if reply.data.is_some() {
                entry.rxcui = reply.data;
            }
        }
        if stale.supplement_cui {
            let reply = supplement::lookup_supplement(
                &self.http,
                self.settings.supplement_api_key.as_deref(),
                name,
            )
            .await;
            cx.trace
                .record_lookup(format!("supplement_lookup:{name}"), &reply);
            refreshed_clean &= reply.completed_clean();
            if reply.data.is_some() {
                entry.supplement_cui = reply.data;
            }
        }
        if stale.label {
            // The identifier may have resolved by now, enabling the label
            // adapter's exact-identifier tier.
            let reply = label::fetch_label(&self.http, name, entry.rxcui.as_deref()).await;
            cx.trace
                .record_interaction(format!("label_warnings:{name}"), &reply);
            refreshed_clean &= reply.completed_clean();
            if reply.data.is_some() {
                entry.label = reply.data;
            }
        }

        // Only a clean refresh restamps the entry; a failed one leaves the
        // stale timestamp so the next request tries again.
        if refreshed_clean {
            entry.updated_at = now;
            if let Err(error) = self.with_conn(|conn| item_cache::upsert_item(conn, &entry)) {
                cx.record_cache_failure(error);
            }
        }
        entry
    }

    /// Cold fan-out: identifier lookups from both authorities plus the
    /// label fetch, in parallel, then one composite cache write.
    async fn fetch_item(&self, name: &str, cx: &RequestCx, now: chrono::DateTime<Utc>) -> ItemEntry {
        let (rx_reply, supplement_reply, label_reply) = tokio::join!(
            rxnorm::lookup_rxcui(&self.http, name),
            supplement::lookup_supplement(
                &self.http,
                self.settings.supplement_api_key.as_deref(),
                name,
            ),
            label::fetch_label(&self.http, name, None),
        );

        cx.trace.record_lookup(format!("rxnorm_lookup:{name}"), &rx_reply);
        cx.trace
            .record_lookup(format!("supplement_lookup:{name}"), &supplement_reply);
        cx.trace
            .record_interaction(format!("label_warnings:{name}"), &label_reply);

        let entry = ItemEntry {
            normalized: name.to_string(),
            rxcui: rx_reply.data,
            supplement_cui: supplement_reply.data,
            label: label_reply.data,
            updated_at: now,
        };
        if let Err(error) = self.with_conn(|conn| item_cache::upsert_item(conn, &entry)) {
            cx.record_cache_failure(error);
        }
        entry
    }

    async fn resolve_exposure(&self, name: &str, cx: &RequestCx) -> Option<ExposureData> {
        if !cx.options.force_refresh {
            match self.with_conn(|conn| db::exposure_cache::get_exposure(conn, name)) {
                Ok(Some(exposure)) => {
                    cx.bump_stats(|s| s.cms_cache_hits += 1);
                    cx.trace.record_cached(format!("exposure:{name}"), true);
                    return Some(exposure);
                }
                Ok(None) => {}
                Err(error) => cx.record_cache_failure(error),
            }
        }
        cx.bump_stats(|s| s.cms_cache_misses += 1);

        let reply = exposure::fetch_exposure(&self.http, name).await;
        cx.trace.record_lookup(format!("exposure:{name}"), &reply);
        let exposure = reply.data?;
        if let Err(error) = self.with_conn(|conn| {
            db::exposure_cache::upsert_exposure(conn, name, &exposure, Utc::now())
        }) {
            cx.record_cache_failure(error);
        }
        Some(exposure)
    }

    // ── Pair phase ──────────────────────────────────────────

    async fn process_pair(
        &self,
        a: &NormalizedItem,
        b: &NormalizedItem,
        item_map: &HashMap<String, ItemInfo>,
        cx: &RequestCx,
    ) -> (String, PairReport) {
        let key = pair_key(&a.normalized, &b.normalized);

        if !cx.options.force_refresh {
            match self.with_conn(|conn| pair_cache::get_pair_report(conn, &key, CALC_VERSION)) {
                Ok(Some(report)) => {
                    cx.bump_stats(|s| s.pair_cache_hits += 1);
                    for source in &report.sources {
                        cx.trace
                            .record_cached(format!("{}:{key}", source.origin), true);
                    }
                    return (key, report);
                }
                Ok(None) => {}
                Err(error) => cx.record_cache_failure(error),
            }
        }
        cx.bump_stats(|s| s.pair_cache_misses += 1);

        let info_a = item_map.get(&a.normalized);
        let info_b = item_map.get(&b.normalized);
        let now = Utc::now();

        // All provider legs fan out in parallel; each upstream call is
        // admitted through the upstream limiter individually.
        let rxnorm_leg = self.rxnorm_leg(&key, info_a, info_b, cx, now);
        let supplement_leg = self.supplement_leg(&key, info_a, info_b, cx, now);
        let adverse_leg = self.adverse_leg(&key, a, b, info_a, info_b, cx, now);
        let literature_leg = self.literature_leg(&key, a, b, info_a, info_b, cx, now);
        let (rx, supp, ae, lit) =
            tokio::join!(rxnorm_leg, supplement_leg, adverse_leg, literature_leg);

        let primary_clean_count = [&rx, &supp, &ae]
            .iter()
            .filter(|leg| leg.attempted && leg.clean)
            .count();
        let rxnorm_failed = rx.attempted && !rx.clean;

        let mut records = Vec::new();
        records.extend(rx.records);
        records.extend(supp.records);
        records.extend(ae.records);
        records.extend(lit.records);
        records.extend(label_overlap_records(a, b, info_a, info_b, now));

        let report =
            assemble::assemble_pair_report(a, b, records, primary_clean_count, rxnorm_failed);
        let hash = assemble::sources_hash(&report.sources);
        if let Err(error) = self.with_conn(|conn| {
            pair_cache::upsert_pair_report(
                conn,
                &key,
                CALC_VERSION,
                &a.normalized,
                &b.normalized,
                &report,
                &hash,
                now,
            )
        }) {
            cx.record_cache_failure(error);
        }
        (key, report)
    }

    async fn rxnorm_leg(
        &self,
        key: &str,
        info_a: Option<&ItemInfo>,
        info_b: Option<&ItemInfo>,
        cx: &RequestCx,
        now: chrono::DateTime<Utc>,
    ) -> CallOutcome {
        let trace_key = format!("rxnorm_interactions:{key}");
        let (Some(cui_a), Some(cui_b)) = (
            info_a.and_then(|i| i.rxcui.as_deref()),
            info_b.and_then(|i| i.rxcui.as_deref()),
        ) else {
            cx.trace.record_skipped(trace_key);
            return CallOutcome::skipped();
        };

        let reply = self
            .upstream
            .run(rxnorm::fetch_interaction(&self.http, cui_a, cui_b))
            .await;
        cx.trace.record_interaction(trace_key, &reply);
        CallOutcome {
            records: reply
                .data
                .as_ref()
                .map(|edge| vec![standardize::standardize_rxnorm(edge, now)])
                .unwrap_or_default(),
            attempted: true,
            clean: reply.completed_clean(),
        }
    }

    async fn supplement_leg(
        &self,
        key: &str,
        info_a: Option<&ItemInfo>,
        info_b: Option<&ItemInfo>,
        cx: &RequestCx,
        now: chrono::DateTime<Utc>,
    ) -> CallOutcome {
        let trace_key = format!("supplement_interactions:{key}");
        let (Some(cui_a), Some(cui_b)) = (
            info_a.and_then(|i| i.supplement_cui.as_deref()),
            info_b.and_then(|i| i.supplement_cui.as_deref()),
        ) else {
            cx.trace.record_skipped(trace_key);
            return CallOutcome::skipped();
        };

        let reply = self
            .upstream
            .run(supplement::fetch_interactions(
                &self.http,
                self.settings.supplement_api_key.as_deref(),
                cui_a,
                cui_b,
            ))
            .await;
        cx.trace.record_interaction(trace_key, &reply);
        CallOutcome {
            records: reply
                .data
                .as_ref()
                .map(|statements| standardize::standardize_supplement(statements, now))
                .unwrap_or_default(),
            attempted: true,
            clean: reply.completed_clean(),
        }
    }

    async fn adverse_leg(
        &self,
        key: &str,
        a: &NormalizedItem,
        b: &NormalizedItem,
        info_a: Option<&ItemInfo>,
        info_b: Option<&ItemInfo>,
        cx: &RequestCx,
        now: chrono::DateTime<Utc>,
    ) -> CallOutcome {
        let trace_key = format!("pair_adverse_events:{key}");
        let reply = self
            .upstream
            .run(adverse::fetch_pair_events(
                &self.http,
                &a.normalized,
                &b.normalized,
            ))
            .await;
        cx.trace.record_interaction(trace_key, &reply);

        let exposure_a = info_a.and_then(|i| i.exposure.as_ref()).map(|e| e.beneficiaries);
        let exposure_b = info_b.and_then(|i| i.exposure.as_ref()).map(|e| e.beneficiaries);
        CallOutcome {
            records: reply
                .data
                .as_ref()
                .map(|summary| {
                    vec![standardize::standardize_pair_adverse(
                        &a.normalized,
                        &b.normalized,
                        summary,
                        exposure_a,
                        exposure_b,
                        now,
                    )]
                })
                .unwrap_or_default(),
            attempted: true,
            clean: reply.completed_clean(),
        }
    }

    async fn literature_leg(
        &self,
        key: &str,
        a: &NormalizedItem,
        b: &NormalizedItem,
        info_a: Option<&ItemInfo>,
        info_b: Option<&ItemInfo>,
        cx: &RequestCx,
        now: chrono::DateTime<Utc>,
    ) -> CallOutcome {
        let trace_key = format!("literature_ai:{key}");
        if !cx.options.include_ai {
            cx.trace.record_skipped(trace_key);
            return CallOutcome::skipped();
        }

        let digest = pair_digest(a, b, info_a, info_b);
        let reply = self
            .upstream
            .run(self.literature.assess_pair(
                &self.http,
                &a.normalized,
                &b.normalized,
                &digest,
                now,
            ))
            .await;
        cx.trace.record_interaction(trace_key, &reply);
        let clean = reply.completed_clean();
        CallOutcome {
            records: reply.data.map(|record| vec![record]).unwrap_or_default(),
            attempted: true,
            clean,
        }
    }

    // ── Single phase ────────────────────────────────────────

    /// The adverse-event fetch is non-blocking: its failure degrades the
    /// report, it never fails the item.
    async fn build_single(
        &self,
        item: &NormalizedItem,
        item_map: &HashMap<String, ItemInfo>,
        cx: &RequestCx,
    ) -> crate::report::SingleReport {
        let name = &item.normalized;
        let now = Utc::now();
        let info = item_map.get(name);

        let reply = self
            .upstream
            .run(adverse::fetch_single_events(&self.http, name))
            .await;
        cx.trace
            .record_interaction(format!("single_drug_adverse_events:{name}"), &reply);

        let mut records = Vec::new();
        if let Some(summary) = &reply.data {
            let exposure = info
                .and_then(|i| i.exposure.as_ref())
                .map(|e| e.beneficiaries);
            records.push(standardize::standardize_single_adverse(
                name, summary, exposure, now,
            ));
        }
        if let Some(label_data) = info.and_then(|i| i.label.as_ref()) {
            if let Some(record) = standardize::standardize_label_single(name, label_data, now) {
                records.push(record);
            }
        }

        assemble::assemble_single_report(item, records, reply.completed_clean())
    }

    // ── Shared plumbing ─────────────────────────────────────

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match self.db.lock() {
            Ok(conn) => f(&conn),
            Err(_) => Err(DatabaseError::LockPoisoned),
        }
    }

    fn snapshot_stats(&self, cx: &RequestCx) -> CacheStats {
        cx.stats.lock().map(|stats| *stats).unwrap_or_default()
    }

    fn write_usage(&self, response: &AnalysisResponse, latency_ms: i64) {
        let max_severity = response
            .results
            .pairs
            .iter()
            .map(|pair| pair.severity)
            .max()
            .unwrap_or_default();
        let entry = usage_log::UsageEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: json!(response.items),
            summary: json!({
                "singles": response.results.singles.len(),
                "pairs": response.results.pairs.len(),
                "triples": response.results.triples.len(),
                "maxSeverity": max_severity,
            }),
            latency_ms,
            cache_hits: serde_json::to_value(response.meta.cache_stats)
                .unwrap_or_else(|_| json!({})),
        };
        if let Err(error) = self.with_conn(|conn| usage_log::insert_usage(conn, &entry)) {
            tracing::warn!(error = %error, "usage log write failed");
        }
    }
}

/// Pair-level label evidence derived from the item phase: each item's
/// cached warnings checked for a mention of the other item. No fetch.
fn label_overlap_records(
    a: &NormalizedItem,
    b: &NormalizedItem,
    info_a: Option<&ItemInfo>,
    info_b: Option<&ItemInfo>,
    now: chrono::DateTime<Utc>,
) -> Vec<EvidenceRecord> {
    let mut records = Vec::new();
    if let Some(label_a) = info_a.and_then(|i| i.label.as_ref()) {
        records.extend(standardize::standardize_label_overlap(
            &a.normalized,
            &b.normalized,
            label_a,
            now,
        ));
    }
    if let Some(label_b) = info_b.and_then(|i| i.label.as_ref()) {
        records.extend(standardize::standardize_label_overlap(
            &b.normalized,
            &a.normalized,
            label_b,
            now,
        ));
    }
    records
}

fn pair_digest(
    a: &NormalizedItem,
    b: &NormalizedItem,
    info_a: Option<&ItemInfo>,
    info_b: Option<&ItemInfo>,
) -> EvidenceDigest {
    let mentions = |label: Option<&LabelData>, partner: &str| -> usize {
        label
            .map(|l| {
                let needle = partner.to_lowercase();
                l.warnings
                    .iter()
                    .filter(|w| w.to_lowercase().contains(&needle))
                    .count()
            })
            .unwrap_or(0)
    };
    let label_warning_count = mentions(info_a.and_then(|i| i.label.as_ref()), &b.normalized)
        + mentions(info_b.and_then(|i| i.label.as_ref()), &a.normalized);

    let mut known_sources = Vec::new();
    if info_a.and_then(|i| i.rxcui.as_ref()).is_some()
        && info_b.and_then(|i| i.rxcui.as_ref()).is_some()
    {
        known_sources.push("rxnorm".to_string());
    }
    if label_warning_count > 0 {
        known_sources.push("label_warnings".to_string());
    }

    EvidenceDigest {
        label_warning_count,
        adverse_total: None,
        adverse_serious: None,
        known_sources,
    }
}
