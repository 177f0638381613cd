#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;
use tessera_arch::Board;
use tessera_common::{BlockId, NetId};
use tessera_config::{AnnealConfig, ClusterCount, PlacerConfig};
use tessera_place::{Design, Embedding, Executor, LocalExecutor, PlaceError, Placement, PlacementJob};

pub fn id(s: &str) -> BlockId {
    BlockId::new(s).unwrap()
}

pub fn grid(width: usize, height: usize) -> Board {
    let rows: Vec<String> = (0..height).map(|_| "p".repeat(width)).collect();
    Board::from_layout("grid", &rows).unwrap()
}

/// A 10x10 board: I/O ring, one memory column, compute elsewhere.
pub fn mixed_board() -> Board {
    let mut rows = vec!["iiiiiiiiii"];
    rows.extend(std::iter::repeat("ipppmppppi").take(8));
    rows.push("iiiiiiiiii");
    Board::from_layout("mixed", &rows).unwrap()
}

pub fn fast_config(seed: u64, clusters: ClusterCount) -> PlacerConfig {
    let mut config = PlacerConfig::default();
    config.placer.seed = seed;
    config.placer.clusters = clusters;
    config.anneal = AnnealConfig {
        coarse_steps: 400,
        steps_per_block: 20,
        min_steps: 200,
        ..AnnealConfig::default()
    };
    config
}

/// Adds `blocks` to the embedding at `centre`, spread slightly by index.
pub fn embed(emb: &mut Embedding, blocks: &[BlockId], centre: f64) {
    for (i, b) in blocks.iter().enumerate() {
        emb.insert(b.clone(), vec![centre + i as f64 * 0.01, centre])
            .unwrap();
    }
}

/// Chains `blocks` with two-pin nets named `<prefix><i>`.
pub fn chain(design: &mut Design, prefix: &str, blocks: &[BlockId]) {
    for (i, pair) in blocks.windows(2).enumerate() {
        design
            .netlist
            .insert(NetId::new(format!("{prefix}{i}")), pair.to_vec());
    }
}

/// Two well-separated groups of 20 compute blocks.
pub fn two_group_design() -> (Design, BTreeSet<BlockId>, BTreeSet<BlockId>) {
    let a: Vec<BlockId> = (0..20).map(|i| id(&format!("p{i}"))).collect();
    let b: Vec<BlockId> = (20..40).map(|i| id(&format!("p{i}"))).collect();
    let mut design = Design {
        embedding: Embedding::new(2),
        ..Design::default()
    };
    embed(&mut design.embedding, &a, 0.0);
    embed(&mut design.embedding, &b, 100.0);
    chain(&mut design, "a", &a);
    chain(&mut design, "b", &b);
    (
        design,
        a.into_iter().collect(),
        b.into_iter().collect(),
    )
}

/// A design with I/O, memory and register blocks on [`mixed_board`].
pub fn mixed_design() -> Design {
    let compute: Vec<BlockId> = (0..24).map(|i| id(&format!("p{i}"))).collect();
    let memory: Vec<BlockId> = (0..5).map(|i| id(&format!("m{i}"))).collect();
    let registers: Vec<BlockId> = (0..10).map(|i| id(&format!("r{i}"))).collect();
    let io: Vec<BlockId> = (0..4).map(|i| id(&format!("i{i}"))).collect();

    let mut design = Design {
        embedding: Embedding::new(2),
        ..Design::default()
    };
    embed(&mut design.embedding, &compute[..12], 0.0);
    embed(&mut design.embedding, &compute[12..], 50.0);
    embed(&mut design.embedding, &memory, 25.0);
    embed(&mut design.embedding, &registers, 10.0);

    let mut order: Vec<BlockId> = Vec::new();
    order.push(io[0].clone());
    order.extend(compute[..12].iter().cloned());
    order.extend(memory.iter().cloned());
    order.push(io[1].clone());
    order.extend(compute[12..].iter().cloned());
    order.extend(registers.iter().cloned());
    order.push(io[2].clone());
    order.push(io[3].clone());
    chain(&mut design, "e", &order);
    design
        .netlist
        .insert(NetId::from("fan"), vec![id("p0"), id("p12"), id("m0"), id("r0"), id("i3")]);
    design
}

/// Records every submitted job before delegating to a local pool.
pub struct RecordingExecutor {
    pub inner: LocalExecutor,
    pub jobs: Mutex<Vec<PlacementJob>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            inner: LocalExecutor::new(Some(4)),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<PlacementJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    fn submit(&self, jobs: Vec<PlacementJob>) -> Result<Placement, PlaceError> {
        self.jobs.lock().unwrap().extend(jobs.iter().cloned());
        self.inner.submit(jobs)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
