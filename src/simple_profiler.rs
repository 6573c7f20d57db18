//! Simple profiling macros using thread-local storage
//!
//! Lightweight timing of the search hot paths without changing function signatures.
//! Enable with environment variable: QUIXO_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

thread_local! {
    static MOVE_GEN_TIME: RefCell<u64> = const { RefCell::new(0) };
    static MOVE_GEN_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static EVAL_TIME: RefCell<u64> = const { RefCell::new(0) };
    static EVAL_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static CANONICAL_TIME: RefCell<u64> = const { RefCell::new(0) };
    static CANONICAL_COUNT: RefCell<usize> = const { RefCell::new(0) };

    static ALPHA_BETA_TIME: RefCell<u64> = const { RefCell::new(0) };
    static ALPHA_BETA_COUNT: RefCell<usize> = const { RefCell::new(0) };
    static ALPHA_BETA_CUTOFFS: RefCell<usize> = const { RefCell::new(0) };

    static TT_LOOKUPS: RefCell<usize> = const { RefCell::new(0) };
    static TT_HITS: RefCell<usize> = const { RefCell::new(0) };
}

// Global aggregators
static GLOBAL_MOVE_GEN_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_MOVE_GEN_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_EVAL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_EVAL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_CANONICAL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_CANONICAL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_ALPHA_BETA_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_ALPHA_BETA_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_ALPHA_BETA_CUTOFFS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_TT_LOOKUPS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_TT_HITS: AtomicUsize = AtomicUsize::new(0);

static PROFILING_ENABLED: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn is_profiling_enabled() -> bool {
    *PROFILING_ENABLED.get_or_init(|| std::env::var("QUIXO_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        match self.category {
            "move_gen" => {
                MOVE_GEN_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                MOVE_GEN_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "eval" => {
                EVAL_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                EVAL_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "canonical" => {
                CANONICAL_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                CANONICAL_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "alpha_beta" => {
                ALPHA_BETA_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                ALPHA_BETA_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            _ => {}
        }
    }
}

#[inline]
pub fn record_alpha_beta_cutoff() {
    if is_profiling_enabled() {
        ALPHA_BETA_CUTOFFS.with(|c| *c.borrow_mut() += 1);
    }
}

#[inline]
pub fn record_tt_lookup(hit: bool) {
    if is_profiling_enabled() {
        TT_LOOKUPS.with(|c| *c.borrow_mut() += 1);
        if hit {
            TT_HITS.with(|c| *c.borrow_mut() += 1);
        }
    }
}

fn drain_time(local: &'static std::thread::LocalKey<RefCell<u64>>, global: &AtomicU64) {
    local.with(|t| {
        global.fetch_add(*t.borrow(), Ordering::Relaxed);
        *t.borrow_mut() = 0;
    });
}

fn drain_count(local: &'static std::thread::LocalKey<RefCell<usize>>, global: &AtomicUsize) {
    local.with(|c| {
        global.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

/// Folds the calling thread's counters into the global totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    drain_time(&MOVE_GEN_TIME, &GLOBAL_MOVE_GEN_TIME);
    drain_count(&MOVE_GEN_COUNT, &GLOBAL_MOVE_GEN_COUNT);
    drain_time(&EVAL_TIME, &GLOBAL_EVAL_TIME);
    drain_count(&EVAL_COUNT, &GLOBAL_EVAL_COUNT);
    drain_time(&CANONICAL_TIME, &GLOBAL_CANONICAL_TIME);
    drain_count(&CANONICAL_COUNT, &GLOBAL_CANONICAL_COUNT);
    drain_time(&ALPHA_BETA_TIME, &GLOBAL_ALPHA_BETA_TIME);
    drain_count(&ALPHA_BETA_COUNT, &GLOBAL_ALPHA_BETA_COUNT);
    drain_count(&ALPHA_BETA_CUTOFFS, &GLOBAL_ALPHA_BETA_CUTOFFS);
    drain_count(&TT_LOOKUPS, &GLOBAL_TT_LOOKUPS);
    drain_count(&TT_HITS, &GLOBAL_TT_HITS);
}

fn print_category(name: &str, time: &AtomicU64, count: &AtomicUsize, total_ns: u64) {
    let time = time.load(Ordering::Relaxed);
    let count = count.load(Ordering::Relaxed);
    let ms = time as f64 / 1_000_000.0;
    let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
    let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

    eprintln!("{}:", name);
    eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
    eprintln!("  Calls:    {}", count);
    eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    print_category("Move Generation", &GLOBAL_MOVE_GEN_TIME, &GLOBAL_MOVE_GEN_COUNT, total_ns);
    print_category("Evaluation", &GLOBAL_EVAL_TIME, &GLOBAL_EVAL_COUNT, total_ns);
    print_category("Canonical Keys", &GLOBAL_CANONICAL_TIME, &GLOBAL_CANONICAL_COUNT, total_ns);

    // alpha-beta time is inclusive of everything below it
    let ab_count = GLOBAL_ALPHA_BETA_COUNT.load(Ordering::Relaxed);
    let ab_cutoffs = GLOBAL_ALPHA_BETA_CUTOFFS.load(Ordering::Relaxed);
    let cutoff_rate = if ab_count > 0 { 100.0 * ab_cutoffs as f64 / ab_count as f64 } else { 0.0 };
    eprintln!("Search:");
    eprintln!(
        "  Alpha-Beta: {:.2}ms - {} nodes, {:.1}% cutoff rate\n",
        GLOBAL_ALPHA_BETA_TIME.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        ab_count,
        cutoff_rate
    );

    let tt_lookups = GLOBAL_TT_LOOKUPS.load(Ordering::Relaxed);
    let tt_hits = GLOBAL_TT_HITS.load(Ordering::Relaxed);
    let hit_rate = if tt_lookups > 0 { 100.0 * tt_hits as f64 / tt_lookups as f64 } else { 0.0 };

    eprintln!("Transposition Table:");
    eprintln!("  Lookups:    {}", tt_lookups);
    eprintln!("  Hits:       {} ({:.1}%)\n", tt_hits, hit_rate);

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
