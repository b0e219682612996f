//! Greedy offset allocation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Offset;
use crate::domain::CarbonMass;

/// Order in which offsets are drawn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Ascending offset id, i.e. registration order.
    #[default]
    OldestFirst,
    /// Ascending price per tonne, ties broken by id.
    CheapestFirst,
}

impl AllocationPolicy {
    /// Configuration name of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OldestFirst => "oldest_first",
            Self::CheapestFirst => "cheapest_first",
        }
    }

    fn compare(self, left: &Offset, right: &Offset) -> Ordering {
        match self {
            Self::OldestFirst => left.id().cmp(&right.id()),
            Self::CheapestFirst => left
                .price_per_tonne_cents()
                .cmp(&right.price_per_tonne_cents())
                .then_with(|| left.id().cmp(&right.id())),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown allocation policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown allocation policy `{0}`; expected oldest_first or cheapest_first")]
pub struct ParsePolicyError(pub String);

impl FromStr for AllocationPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "oldest_first" => Ok(Self::OldestFirst),
            "cheapest_first" => Ok(Self::CheapestFirst),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

/// Whether a request may be partially satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Reject the request unless supply covers the whole target.
    Full,
    /// Allocate what is available and report the shortfall.
    #[default]
    Partial,
}

/// How much a product allocation should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllocationTarget {
    /// Whatever part of the product's estimate is not yet covered.
    #[default]
    Outstanding,
    /// An explicit quantity, independent of the estimate.
    Exact(CarbonMass),
}

impl AllocationTarget {
    /// Resolve against a product's estimate and its existing allocations.
    ///
    /// # Examples
    /// ```
    /// use carbontrack::domain::offsets::AllocationTarget;
    /// use carbontrack::domain::CarbonMass;
    ///
    /// let estimated = CarbonMass::from_whole_tonnes(10);
    /// let covered = CarbonMass::from_whole_tonnes(4);
    /// assert_eq!(
    ///     AllocationTarget::Outstanding.resolve(estimated, covered),
    ///     CarbonMass::from_whole_tonnes(6)
    /// );
    /// ```
    pub fn resolve(self, estimated: CarbonMass, already_allocated: CarbonMass) -> CarbonMass {
        match self {
            Self::Outstanding => estimated.saturating_sub(already_allocated),
            Self::Exact(quantity) => quantity,
        }
    }
}

/// Target quantity plus coverage requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub target: CarbonMass,
    pub coverage: CoverageMode,
}

/// One offset drawn down by an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationLine {
    /// Offset state after the decrement.
    pub offset: Offset,
    pub consumed: CarbonMass,
    pub cost_cents: u64,
}

/// Outcome of an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub lines: Vec<AllocationLine>,
    pub requested: CarbonMass,
    pub allocated: CarbonMass,
    pub shortfall: CarbonMass,
    pub cost_cents: u64,
}

impl Allocation {
    fn empty(requested: CarbonMass) -> Self {
        Self {
            lines: Vec::new(),
            requested,
            allocated: CarbonMass::ZERO,
            shortfall: requested,
            cost_cents: 0,
        }
    }

    /// Whether the target was fully covered.
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Allocation rejected without touching any offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("insufficient offset supply: requested {requested}, available {available}")]
    InsufficientSupply {
        requested: CarbonMass,
        available: CarbonMass,
    },
}

fn line_cost_cents(consumed: CarbonMass, price_per_tonne_cents: u64) -> u64 {
    let numerator = u128::from(consumed.kilograms()) * u128::from(price_per_tonne_cents);
    u64::try_from(numerator.div_ceil(1_000)).unwrap_or(u64::MAX)
}

/// Pure greedy allocator.
///
/// # Examples
/// ```
/// use carbontrack::domain::offsets::{AllocationRequest, CoverageMode, OffsetAllocator};
/// use carbontrack::domain::CarbonMass;
///
/// let allocator = OffsetAllocator::default();
/// let request = AllocationRequest {
///     target: CarbonMass::from_whole_tonnes(1),
///     coverage: CoverageMode::Partial,
/// };
/// let allocation = allocator.allocate(request, &mut []).expect("partial never fails");
/// assert_eq!(allocation.shortfall, CarbonMass::from_whole_tonnes(1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetAllocator {
    policy: AllocationPolicy,
}

impl OffsetAllocator {
    /// Allocator using `policy`.
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Draw `request.target` down from `pool`, mutating the offsets in place.
    ///
    /// Exhausted offsets are skipped. In [`CoverageMode::Full`] the supply
    /// check runs before any decrement, so an error leaves `pool` untouched.
    pub fn allocate(
        &self,
        request: AllocationRequest,
        pool: &mut [Offset],
    ) -> Result<Allocation, AllocationError> {
        let requested = request.target;
        if requested.is_zero() {
            return Ok(Allocation::empty(requested));
        }

        let available: CarbonMass = pool.iter().map(Offset::remaining).sum();
        if request.coverage == CoverageMode::Full && available < requested {
            return Err(AllocationError::InsufficientSupply {
                requested,
                available,
            });
        }

        let mut order: Vec<usize> = (0..pool.len())
            .filter(|&idx| !pool[idx].is_exhausted())
            .collect();
        order.sort_by(|&a, &b| self.policy.compare(&pool[a], &pool[b]));

        let mut allocation = Allocation::empty(requested);
        for idx in order {
            if allocation.shortfall.is_zero() {
                break;
            }
            let offset = &mut pool[idx];
            let consumed = offset.remaining().min(allocation.shortfall);
            if !offset.consume(consumed) {
                continue;
            }
            let cost_cents = line_cost_cents(consumed, offset.price_per_tonne_cents());
            allocation.allocated = allocation.allocated.saturating_add(consumed);
            allocation.shortfall = allocation.shortfall.saturating_sub(consumed);
            allocation.cost_cents = allocation.cost_cents.saturating_add(cost_cents);
            allocation.lines.push(AllocationLine {
                offset: offset.clone(),
                consumed,
                cost_cents,
            });
        }
        Ok(allocation)
    }
}
