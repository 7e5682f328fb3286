//! Barnes-Hut quadtree for the many-body charge.
//!
//! Cells live in one arena. A split appends the four children contiguously,
//! so every child has a higher index than its parent and cell masses can be
//! summed in a single reverse sweep.

use super::types::Vec2;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Debug)]
struct Cell {
	/// Minimum corner of the square.
	corner: Vec2,
	size: f64,
	depth: usize,
	/// Arena index of the first of four children, row-major.
	first_child: Option<usize>,
	points: Vec<usize>,
	mass: f64,
	center_of_mass: Vec2,
}

impl Cell {
	fn new(corner: Vec2, size: f64, depth: usize) -> Self {
		Self {
			corner,
			size,
			depth,
			first_child: None,
			points: Vec::new(),
			mass: 0.0,
			center_of_mass: Vec2::ZERO,
		}
	}

	fn quadrant(&self, point: Vec2) -> usize {
		let half = self.size * 0.5;
		let column = usize::from(point.x >= self.corner.x + half);
		let row = usize::from(point.y >= self.corner.y + half);
		row * 2 + column
	}

	fn contains(&self, point: Vec2) -> bool {
		let far = self.corner + Vec2::new(self.size, self.size);
		(self.corner.x..=far.x).contains(&point.x) && (self.corner.y..=far.y).contains(&point.y)
	}
}

pub(super) struct Quadtree {
	cells: Vec<Cell>,
}

impl Quadtree {
	/// Indexes every finite position; `None` when there is none.
	pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
		let finite = || positions.iter().copied().filter(|point| point.is_finite());
		let first = finite().next()?;
		let (min, max) = finite().fold((first, first), |(lo, hi), p| {
			(Vec2::new(lo.x.min(p.x), lo.y.min(p.y)), Vec2::new(hi.x.max(p.x), hi.y.max(p.y)))
		});
		// Square root cell with a unit margin on every side.
		let size = (max.x - min.x).max(max.y - min.y).max(1.0) + 2.0;
		let corner = min.midpoint(max) - Vec2::new(size * 0.5, size * 0.5);

		let mut tree = Self {
			cells: vec![Cell::new(corner, size, 0)],
		};
		for (index, point) in positions.iter().enumerate() {
			if point.is_finite() {
				tree.insert(index, positions);
			}
		}
		tree.sum_masses(positions);
		Some(tree)
	}

	fn insert(&mut self, index: usize, positions: &[Vec2]) {
		let point = positions[index];
		let mut cell = 0;
		while let Some(first) = self.cells[cell].first_child {
			cell = first + self.cells[cell].quadrant(point);
		}
		self.cells[cell].points.push(index);
		self.split_if_full(cell, positions);
	}

	fn split_if_full(&mut self, cell: usize, positions: &[Vec2]) {
		let Cell {
			corner, size, depth, ..
		} = self.cells[cell];
		if self.cells[cell].points.len() <= LEAF_CAPACITY || depth >= MAX_DEPTH {
			return;
		}

		let half = size * 0.5;
		let first = self.cells.len();
		for quadrant in 0..4 {
			let offset = Vec2::new((quadrant % 2) as f64 * half, (quadrant / 2) as f64 * half);
			self.cells.push(Cell::new(corner + offset, half, depth + 1));
		}
		let points = std::mem::take(&mut self.cells[cell].points);
		self.cells[cell].first_child = Some(first);
		for index in points {
			let child = first + self.cells[cell].quadrant(positions[index]);
			self.cells[child].points.push(index);
		}
		for child in first..first + 4 {
			self.split_if_full(child, positions);
		}
	}

	fn sum_masses(&mut self, positions: &[Vec2]) {
		for index in (0..self.cells.len()).rev() {
			let (mass, weighted) = match self.cells[index].first_child {
				Some(first) => self.cells[first..first + 4]
					.iter()
					.fold((0.0, Vec2::ZERO), |(m, w), child| (m + child.mass, w + child.center_of_mass * child.mass)),
				None => self.cells[index]
					.points
					.iter()
					.fold((0.0, Vec2::ZERO), |(m, w), &point| (m + 1.0, w + positions[point])),
			};
			let cell = &mut self.cells[index];
			cell.mass = mass;
			if mass > 0.0 {
				cell.center_of_mass = weighted / mass;
			}
		}
	}

	/// Adds the velocity change `index` receives from every other point.
	/// Cells far enough away (side / distance below theta) act as one body.
	pub(super) fn accumulate_charge(&self, index: usize, positions: &[Vec2], params: ChargeParams, velocity: &mut Vec2) {
		let point = positions[index];
		let mut pending = vec![0];
		while let Some(cell) = pending.pop() {
			let cell = &self.cells[cell];
			if cell.mass <= 0.0 {
				continue;
			}
			let Some(first) = cell.first_child else {
				for &other in cell.points.iter().filter(|&&other| other != index) {
					let mut delta = positions[other] - point;
					if delta.length_sq() == 0.0 {
						delta = jiggle(index, other);
					}
					*velocity += delta * charge_scale(delta.length_sq(), params);
				}
				continue;
			};

			let delta = cell.center_of_mass - point;
			let distance_sq = delta.length_sq();
			if !cell.contains(point) && distance_sq > 0.0 && cell.size * cell.size / distance_sq < params.theta_sq {
				*velocity += delta * (charge_scale(distance_sq, params) * cell.mass);
			} else {
				pending.extend(first..first + 4);
			}
		}
	}
}

/// Tiny deterministic offset separating coincident points `a` and `b`;
/// antisymmetric so the pair is pushed apart rather than together.
pub(super) fn jiggle(a: usize, b: usize) -> Vec2 {
	let (lo, hi) = if a < b { (a, b) } else { (b, a) };
	let turn = ((lo as f64) * 0.618_034 + (hi as f64) * 0.414_214).fract();
	let angle = turn * std::f64::consts::TAU;
	let offset = Vec2::new(angle.cos(), angle.sin()) * 1e-6;
	if a < b { offset } else { offset * -1.0 }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
	/// Charge strength already multiplied by alpha.
	pub(super) weighted_strength: f64,
	pub(super) theta_sq: f64,
	pub(super) distance_min_sq: f64,
}

fn charge_scale(distance_sq: f64, params: ChargeParams) -> f64 {
	let distance_sq = if distance_sq < params.distance_min_sq {
		(params.distance_min_sq * distance_sq).sqrt()
	} else {
		distance_sq
	};
	params.weighted_strength / distance_sq
}
