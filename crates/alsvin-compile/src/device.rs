//! Device topology model and device specification parsing.
//!
//! A [`Device`] is the undirected connectivity graph of a target machine:
//! which pairs of physical qubits can interact directly, and how far
//! apart any two are. All-pairs distances are precomputed at construction
//! with one BFS per node, so `distance()` is an O(1) table lookup during
//! routing.
//!
//! Devices are built either programmatically (`Device::path`,
//! `Device::grid`, ...) or from a [`DeviceSpec`] string with grammar
//! `name[(dim1[,dim2])]`, `name ∈ {path, ring, star, grid, file}`.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Index of a physical qubit slot on a device.
///
/// Only meaningful relative to one [`Device`]; distinct from the virtual
/// [`QubitId`](alsvin_ir::QubitId) of the source program.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PhysQubit(pub u32);

impl PhysQubit {
    /// The identifier as a plain index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhysQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl From<u32> for PhysQubit {
    fn from(id: u32) -> Self {
        PhysQubit(id)
    }
}

/// Physical qubit connectivity graph with precomputed distances.
///
/// ## Determinism
///
/// Adjacency lists are kept sorted, so `neighbors()` and `edges()`
/// iterate in a fixed order. Routing relies on this for reproducible
/// tie-breaking.
///
/// ## Deserialization
///
/// The adjacency lists and the distance matrix are derived data and are
/// skipped during serialization; call
/// [`rebuild_caches()`](Self::rebuild_caches) after deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// List of connected qubit pairs (undirected, normalized lo < hi).
    edges: Vec<(PhysQubit, PhysQubit)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Sorted adjacency list per qubit.
    #[serde(skip)]
    adjacency: Vec<Vec<PhysQubit>>,
    /// All-pairs shortest-path distances; `u32::MAX` marks unreachable.
    #[serde(skip)]
    dist: Vec<Vec<u32>>,
}

impl Device {
    /// Build a device from an explicit edge list.
    ///
    /// Duplicate edges (in either orientation) and self-loops are
    /// ignored. Fails if the qubit count is zero or an edge endpoint is
    /// out of range.
    pub fn from_edges(
        num_qubits: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> CompileResult<Self> {
        if num_qubits == 0 {
            return Err(CompileError::EmptyDevice);
        }
        let mut normalized: Vec<(PhysQubit, PhysQubit)> = vec![];
        for (a, b) in edges {
            if a >= num_qubits || b >= num_qubits {
                return Err(CompileError::EdgeOutOfRange {
                    q1: a,
                    q2: b,
                    num_qubits,
                });
            }
            if a == b {
                continue;
            }
            let pair = (PhysQubit(a.min(b)), PhysQubit(a.max(b)));
            if !normalized.contains(&pair) {
                normalized.push(pair);
            }
        }
        normalized.sort_unstable();
        let mut device = Self {
            edges: normalized,
            num_qubits,
            adjacency: vec![],
            dist: vec![],
        };
        device.rebuild_caches();
        Ok(device)
    }

    /// Linear path topology: 0-1-2-...-(n-1).
    pub fn path(n: u32) -> CompileResult<Self> {
        Self::from_edges(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Ring topology: a path with the ends joined.
    pub fn ring(n: u32) -> CompileResult<Self> {
        Self::from_edges(n, (0..n).map(|i| (i, (i + 1) % n)))
    }

    /// Star topology: every qubit connected to a designated center.
    pub fn star(n: u32, center: u32) -> CompileResult<Self> {
        if n > 0 && center >= n {
            return Err(CompileError::EdgeOutOfRange {
                q1: center,
                q2: center,
                num_qubits: n,
            });
        }
        Self::from_edges(n, (0..n).filter(|&i| i != center).map(|i| (center, i)))
    }

    /// 2D grid topology of `width × height` qubits, row-major.
    pub fn grid(width: u32, height: u32) -> CompileResult<Self> {
        let n = width * height;
        let mut edges = vec![];
        for r in 0..height {
            for c in 0..width {
                let q = r * width + c;
                if c + 1 < width {
                    edges.push((q, q + 1));
                }
                if r + 1 < height {
                    edges.push((q, q + width));
                }
            }
        }
        Self::from_edges(n, edges)
    }

    /// Fully connected topology (no routing ever needed).
    pub fn full(n: u32) -> CompileResult<Self> {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self::from_edges(n, edges)
    }

    /// Load a device from an edge-list file.
    ///
    /// Line-oriented text: `#` starts a comment, the first data line is
    /// the qubit count, every further data line is one edge `u v`.
    pub fn from_file(path: impl AsRef<Path>) -> CompileResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|_| CompileError::DeviceFileNotFound {
                path: display.clone(),
            })?;

        let mut num_qubits: Option<u32> = None;
        let mut edges = vec![];
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if num_qubits.is_none() {
                let n = line
                    .parse::<u32>()
                    .map_err(|_| CompileError::MalformedDeviceFile {
                        path: display.clone(),
                        line: idx + 1,
                        reason: format!("expected qubit count, found '{line}'"),
                    })?;
                num_qubits = Some(n);
                continue;
            }
            let mut parts = line.split_whitespace();
            let parse = |token: Option<&str>| -> CompileResult<u32> {
                token
                    .and_then(|t| t.parse::<u32>().ok())
                    .ok_or_else(|| CompileError::MalformedDeviceFile {
                        path: display.clone(),
                        line: idx + 1,
                        reason: format!("expected edge 'u v', found '{line}'"),
                    })
            };
            let a = parse(parts.next())?;
            let b = parse(parts.next())?;
            if parts.next().is_some() {
                return Err(CompileError::MalformedDeviceFile {
                    path: display.clone(),
                    line: idx + 1,
                    reason: format!("expected edge 'u v', found '{line}'"),
                });
            }
            edges.push((a, b));
        }

        match num_qubits {
            Some(n) => Self::from_edges(n, edges),
            None => Err(CompileError::EmptyDevice),
        }
    }

    /// Rebuild the adjacency lists and the distance matrix from the edge
    /// list. Must be called after deserialization.
    pub fn rebuild_caches(&mut self) {
        let n = self.num_qubits as usize;
        self.adjacency = vec![vec![]; n];
        for &(a, b) in &self.edges {
            self.adjacency[a.index()].push(b);
            self.adjacency[b.index()].push(a);
        }
        for neighbors in &mut self.adjacency {
            neighbors.sort_unstable();
        }

        self.dist = vec![vec![u32::MAX; n]; n];
        for src in 0..n {
            self.dist[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(PhysQubit(src as u32));
            while let Some(current) = queue.pop_front() {
                let d = self.dist[src][current.index()];
                for &neighbor in &self.adjacency[current.index()] {
                    if self.dist[src][neighbor.index()] == u32::MAX {
                        self.dist[src][neighbor.index()] = d + 1;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    /// Number of physical qubits on the device.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The coupling edges in deterministic order.
    pub fn edges(&self) -> &[(PhysQubit, PhysQubit)] {
        &self.edges
    }

    /// Whether two qubits are directly connected.
    #[inline]
    pub fn are_connected(&self, p1: PhysQubit, p2: PhysQubit) -> bool {
        self.adjacency
            .get(p1.index())
            .is_some_and(|neighbors| neighbors.binary_search(&p2).is_ok())
    }

    /// Neighbors of a qubit, sorted ascending.
    pub fn neighbors(&self, qubit: PhysQubit) -> &[PhysQubit] {
        self.adjacency
            .get(qubit.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Shortest-path distance, or `None` when the qubits sit in
    /// different connected components.
    #[inline]
    pub fn distance(&self, from: PhysQubit, to: PhysQubit) -> Option<usize> {
        let d = self.dist[from.index()][to.index()];
        (d != u32::MAX).then_some(d as usize)
    }
}

/// Parsed device specification.
///
/// Dimensions may be absent for `path`, `ring`, `star` and `grid`; they
/// are inferred from the program's qubit count when the device is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceSpec {
    /// `path[(N)]`
    Path {
        /// Number of qubits, if given.
        num_qubits: Option<u32>,
    },
    /// `ring[(N)]`
    Ring {
        /// Number of qubits, if given.
        num_qubits: Option<u32>,
    },
    /// `star[(N[,center])]`
    Star {
        /// Number of qubits, if given.
        num_qubits: Option<u32>,
        /// Center qubit index; defaults to 0.
        center: u32,
    },
    /// `grid[(W,H)]`
    Grid {
        /// Width and height, if given.
        dims: Option<(u32, u32)>,
    },
    /// `file(/abs/path)`
    File {
        /// Path to the edge-list file.
        path: PathBuf,
    },
}

impl DeviceSpec {
    /// Build the device, inferring absent dimensions from the program's
    /// qubit count (side length `⌈√n⌉` for `grid`).
    pub fn build(&self, program_qubits: u32) -> CompileResult<Device> {
        match self {
            DeviceSpec::Path { num_qubits } => {
                Device::path(num_qubits.unwrap_or(program_qubits))
            }
            DeviceSpec::Ring { num_qubits } => {
                Device::ring(num_qubits.unwrap_or(program_qubits))
            }
            DeviceSpec::Star { num_qubits, center } => {
                Device::star(num_qubits.unwrap_or(program_qubits), *center)
            }
            DeviceSpec::Grid { dims } => {
                let (w, h) = dims.unwrap_or_else(|| {
                    let side = (program_qubits as f64).sqrt().ceil() as u32;
                    (side, side)
                });
                Device::grid(w, h)
            }
            DeviceSpec::File { path } => Device::from_file(path),
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = CompileError;

    fn from_str(s: &str) -> CompileResult<Self> {
        let spec = s.trim();
        let malformed = |reason: &str| CompileError::MalformedDeviceSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, args) = match spec.find('(') {
            Some(open) => {
                let rest = &spec[open + 1..];
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| malformed("missing closing ')'"))?;
                (&spec[..open], Some(inner.trim()))
            }
            None => (spec, None),
        };

        let dims = |args: Option<&str>, max: usize| -> CompileResult<Vec<u32>> {
            let Some(args) = args else {
                return Ok(vec![]);
            };
            if args.is_empty() {
                return Ok(vec![]);
            }
            let parsed: Result<Vec<u32>, _> = args
                .split(',')
                .map(|d| d.trim().parse::<u32>())
                .collect();
            let parsed = parsed.map_err(|_| malformed("dimensions must be integers"))?;
            if parsed.len() > max {
                return Err(malformed("too many dimensions"));
            }
            Ok(parsed)
        };

        match name.to_ascii_lowercase().as_str() {
            "path" => {
                let d = dims(args, 1)?;
                Ok(DeviceSpec::Path {
                    num_qubits: d.first().copied(),
                })
            }
            "ring" => {
                let d = dims(args, 1)?;
                Ok(DeviceSpec::Ring {
                    num_qubits: d.first().copied(),
                })
            }
            "star" => {
                let d = dims(args, 2)?;
                Ok(DeviceSpec::Star {
                    num_qubits: d.first().copied(),
                    center: d.get(1).copied().unwrap_or(0),
                })
            }
            "grid" => {
                let d = dims(args, 2)?;
                match d.as_slice() {
                    [] => Ok(DeviceSpec::Grid { dims: None }),
                    [w, h] => Ok(DeviceSpec::Grid { dims: Some((*w, *h)) }),
                    _ => Err(malformed("grid requires two dimensions")),
                }
            }
            "file" => match args {
                Some(path) if !path.is_empty() => Ok(DeviceSpec::File {
                    path: PathBuf::from(path),
                }),
                _ => Err(malformed(
                    "filename must be provided like file(/full/path/to/device_file.txt)",
                )),
            },
            _ => Err(CompileError::UnknownTopology {
                spec: s.to_string(),
            }),
        }
    }
}
