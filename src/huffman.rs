// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Canonical Huffman coding over symbol ids.
//!
//! The encoder builds a Huffman tree from a frequency table with a min-heap,
//! reads the code length of every symbol off the tree and then assigns
//! canonical codewords: symbols sorted by `(length, id)` receive
//! consecutive codes. Only `(id, length)` pairs need to be stored; the
//! decoder repeats the canonical assignment and walks a tree built from the
//! resulting codes one bit at a time.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};
use crate::rle::Symbol;
use crate::util::tracing_wrappers::*;

/// Longest codeword the container can describe.
pub const MAX_CODE_LENGTH: u32 = 63;

/// Number of occurrences of every symbol id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: BTreeMap<u32, u64>,
}

impl Histogram {
    pub fn new() -> Histogram {
        Histogram::default()
    }

    pub fn add(&mut self, id: u32) {
        self.add_count(id, 1);
    }

    pub fn add_count(&mut self, id: u32, count: u64) {
        if count > 0 {
            *self.counts.entry(id).or_default() += count;
        }
    }

    pub fn add_symbols(&mut self, symbols: &[Symbol]) {
        for sym in symbols {
            self.add(sym.id());
        }
    }

    /// Folds `other` into `self`. The result does not depend on the order in
    /// which partial histograms are merged.
    pub fn merge(&mut self, other: &Histogram) {
        for (&id, &count) in &other.counts {
            self.add_count(id, count);
        }
    }

    /// Number of distinct symbols.
    pub fn alphabet_size(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(id, count)` pairs in increasing id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts.iter().map(|(&id, &count)| (id, count))
    }
}

impl FromIterator<Symbol> for Histogram {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        let mut histogram = Histogram::new();
        for sym in iter {
            histogram.add(sym.id());
        }
        histogram
    }
}

/// Handle of a node in a [`HuffmanTree`] arena.
type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Leaf { weight: u64, symbol: u32 },
    Internal { weight: u64, left: NodeId, right: NodeId },
}

impl Node {
    fn weight(&self) -> u64 {
        match *self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => weight,
        }
    }
}

/// A Huffman tree stored in a single arena; children are referenced by
/// index, the root is the last node pushed.
#[derive(Debug)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
}

impl HuffmanTree {
    /// Greedy construction: repeatedly merges the two lightest nodes.
    ///
    /// Ties on weight are broken by creation order. Leaves are created first
    /// in increasing id order, merged nodes afterwards in the order they are
    /// formed, so identical histograms always yield identical trees. The
    /// first node popped becomes the left (`0`) child.
    pub fn build(histogram: &Histogram) -> Result<HuffmanTree> {
        if histogram.alphabet_size() == 0 {
            return Err(Error::EmptyAlphabet);
        }
        let mut nodes: Vec<Node> = histogram
            .iter()
            .map(|(symbol, weight)| Node::Leaf { weight, symbol })
            .collect();
        // Creation order equals arena index, so the node id doubles as the
        // secondary key.
        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| Reverse((n.weight(), i as NodeId)))
            .collect();
        while let Some(Reverse((w0, left))) = heap.pop() {
            let Some(Reverse((w1, right))) = heap.pop() else {
                // `left` is the root.
                break;
            };
            let weight = w0.saturating_add(w1);
            let id = nodes.len() as NodeId;
            nodes.push(Node::Internal {
                weight,
                left,
                right,
            });
            heap.push(Reverse((weight, id)));
        }
        Ok(HuffmanTree { nodes })
    }

    fn root(&self) -> NodeId {
        (self.nodes.len() - 1) as NodeId
    }

    /// Depth-first walk returning `(symbol, path, depth)` per leaf, where
    /// `path` holds one bit per edge (left = 0), first edge most
    /// significant. A lone leaf is given the one-bit path `0`.
    pub fn paths(&self) -> Vec<(u32, u64, u32)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root(), 0u64, 0u32)];
        while let Some((id, path, depth)) = stack.pop() {
            match self.nodes[id as usize] {
                Node::Leaf { symbol, .. } => out.push((symbol, path, depth.max(1))),
                Node::Internal { left, right, .. } => {
                    // Depth is bounded by the number of leaves; paths deeper
                    // than 64 bits are rejected by the caller, keep the shift
                    // in range meanwhile.
                    let shifted = path.checked_shl(1).unwrap_or(0);
                    stack.push((right, shifted | 1, depth + 1));
                    stack.push((left, shifted, depth + 1));
                }
            }
        }
        out
    }

    /// `(symbol, code length)` for every leaf.
    pub fn code_lengths(&self) -> Vec<(u32, u32)> {
        self.paths()
            .into_iter()
            .map(|(symbol, _, depth)| (symbol, depth))
            .collect()
    }
}

/// One row of a canonical code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    pub symbol: u32,
    pub length: u32,
    /// The `length` low bits, first bit most significant.
    pub code: u64,
}

/// Canonical prefix code: entries sorted by `(length, symbol)`, codes
/// assigned consecutively within each length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
    index: HashMap<u32, usize>,
}

impl CodeTable {
    /// Builds the optimal canonical code for `histogram`.
    pub fn from_histogram(histogram: &Histogram) -> Result<CodeTable> {
        let tree = HuffmanTree::build(histogram)?;
        let table = Self::from_lengths(tree.code_lengths())?;
        debug!(
            alphabet_size = table.len(),
            max_length = table.max_length(),
            "built Huffman code"
        );
        Ok(table)
    }

    /// Assigns canonical codes to `(symbol, length)` pairs given in any
    /// order. The lengths must describe a complete prefix code, or a single
    /// symbol of length 1.
    pub fn from_lengths(mut lengths: Vec<(u32, u32)>) -> Result<CodeTable> {
        lengths.sort_by_key(|&(symbol, length)| (length, symbol));
        Self::from_canonical_lengths(&lengths)
    }

    /// Like [`Self::from_lengths`], but requires the pairs to already be
    /// strictly increasing in `(length, symbol)`, as they are stored.
    pub fn from_canonical_lengths(lengths: &[(u32, u32)]) -> Result<CodeTable> {
        if lengths.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        let mut entries = Vec::with_capacity(lengths.len());
        let mut index = HashMap::with_capacity(lengths.len());
        let mut code = 0u64;
        let mut prev_length = lengths[0].1;
        for (i, &(symbol, length)) in lengths.iter().enumerate() {
            if length == 0 || length > MAX_CODE_LENGTH {
                return Err(Error::InvalidCodeLength(length));
            }
            if i > 0 && (prev_length, lengths[i - 1].0) >= (length, symbol) {
                // Unsorted input, or a symbol listed twice.
                return Err(Error::InvalidHuffman);
            }
            code <<= length - prev_length;
            if code >> length != 0 {
                // Over-subscribed: more codes than fit in `length` bits.
                return Err(Error::InvalidHuffman);
            }
            entries.push(CodeEntry {
                symbol,
                length,
                code,
            });
            index.insert(symbol, i);
            code += 1;
            prev_length = length;
        }
        let complete = code == 1u64 << prev_length;
        let lone_symbol = entries.len() == 1 && prev_length == 1;
        if !complete && !lone_symbol {
            return Err(Error::InvalidHuffman);
        }
        Ok(CodeTable { entries, index })
    }

    /// Entries in canonical order.
    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_length(&self) -> u32 {
        self.entries.last().map_or(0, |e| e.length)
    }

    pub fn get(&self, symbol: u32) -> Option<&CodeEntry> {
        self.index.get(&symbol).map(|&i| &self.entries[i])
    }

    /// Writes the codeword of every symbol, in order. Returns the number of
    /// bits written.
    pub fn encode(&self, symbols: &[Symbol], writer: &mut BitWriter) -> Result<u64> {
        let start = writer.total_bits_written();
        for sym in symbols {
            let id = sym.id();
            let entry = self.get(id).ok_or(Error::InvalidSymbol(id))?;
            writer.write_code(entry.length as usize, entry.code);
        }
        Ok((writer.total_bits_written() - start) as u64)
    }

    /// Total payload size, in bits, of coding `histogram` with this table.
    pub fn encoded_bits(&self, histogram: &Histogram) -> Option<u64> {
        histogram.iter().try_fold(0u64, |acc, (id, count)| {
            let entry = self.get(id)?;
            acc.checked_add(count.checked_mul(entry.length as u64)?)
        })
    }

    pub fn decoder(&self) -> HuffmanDecoder {
        HuffmanDecoder::new(self)
    }
}

const NO_CHILD: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
enum DecodeNode {
    Leaf(u32),
    Internal([u32; 2]),
}

/// Bit-serial decoder: a binary tree rebuilt from the canonical codes.
#[derive(Debug)]
pub struct HuffmanDecoder {
    nodes: Vec<DecodeNode>,
}

impl HuffmanDecoder {
    fn new(table: &CodeTable) -> HuffmanDecoder {
        let mut nodes = vec![DecodeNode::Internal([NO_CHILD; 2])];
        for entry in table.entries() {
            let mut current = 0usize;
            for depth in (0..entry.length).rev() {
                let bit = ((entry.code >> depth) & 1) as usize;
                let next = match nodes[current] {
                    DecodeNode::Internal(children) => children[bit],
                    // The table is prefix-free, so no leaf is ever extended.
                    DecodeNode::Leaf(_) => unreachable!("prefix-free code"),
                };
                current = if next != NO_CHILD {
                    next as usize
                } else {
                    let id = nodes.len();
                    nodes.push(if depth == 0 {
                        DecodeNode::Leaf(entry.symbol)
                    } else {
                        DecodeNode::Internal([NO_CHILD; 2])
                    });
                    if let DecodeNode::Internal(children) = &mut nodes[current] {
                        children[bit] = id as u32;
                    }
                    id
                };
            }
        }
        HuffmanDecoder { nodes }
    }

    /// Reads bits until a leaf is reached and returns its symbol id.
    pub fn read(&self, br: &mut BitReader) -> Result<u32> {
        let mut current = 0usize;
        loop {
            let bit = br.read_bit()? as usize;
            match self.nodes[current] {
                DecodeNode::Internal(children) if children[bit] != NO_CHILD => {
                    current = children[bit] as usize;
                }
                _ => return Err(Error::InvalidCodeword),
            }
            if let DecodeNode::Leaf(symbol) = self.nodes[current] {
                trace!(symbol, bits = br.total_bits_read(), "decoded symbol");
                return Ok(symbol);
            }
        }
    }
}
