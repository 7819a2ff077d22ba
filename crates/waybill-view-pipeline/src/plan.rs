//! Declarative resolution plans.
//!
//! A plan is an ordered list of named steps. Each step names a field path
//! whose stubs get replaced by fetched bodies, and the steps it must run
//! after. Paths are dot-separated field names; a `[]` suffix iterates an
//! array:
//!
//! ```text
//! deliveryLocation                      one slot
//! waybillNumber.containedWaybills[]     one slot per contained waybill
//! parties[].partyDetails                one slot per party
//! ```
//!
//! Dependencies may only point at earlier steps, so every valid plan is
//! acyclic. A step whose target lies beneath another step's target must
//! depend on it, directly or transitively.

use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use waybill_view_core::ResourceRef;

/// Step resolving the shipment's delivery location.
pub const DELIVERY_LOCATION: &str = "delivery-location";

/// Step resolving the master waybill.
pub const MASTER_WAYBILL: &str = "master-waybill";

/// Step resolving the waybills contained in the master waybill.
pub const CONTAINED_WAYBILLS: &str = "contained-waybills";

/// Opt-in step resolving party details.
pub const PARTY_DETAILS: &str = "party-details";

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Descend into a field
    Field(String),
    /// Descend into a field holding an array and visit every element
    Each(String),
}

impl Segment {
    fn name(&self) -> &str {
        match self {
            Segment::Field(name) | Segment::Each(name) => name,
        }
    }
}

/// Path from the document root to the stub slots a step resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Whether `self` addresses slots strictly inside the slots of `other`.
    #[must_use]
    pub fn is_beneath(&self, other: &FieldPath) -> bool {
        self.segments.len() > other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.name() == b.name())
    }

    /// Locate every slot the path addresses in `doc`.
    ///
    /// Slots are returned in document order as JSON pointers paired with the
    /// stub found there.
    ///
    /// # Errors
    ///
    /// Returns error if a field is missing, an iterated field is not an
    /// array, or a slot does not hold a stub.
    pub fn slots(&self, doc: &Value) -> Result<Vec<Slot>, PathError> {
        let mut cursor = vec![(String::new(), doc)];

        for segment in &self.segments {
            let mut next = Vec::with_capacity(cursor.len());
            for (pointer, value) in cursor {
                let name = segment.name();
                let pointer = format!("{pointer}/{}", escape_pointer(name));
                let child = value
                    .get(name)
                    .ok_or_else(|| PathError::MissingField(pointer.clone()))?;

                match segment {
                    Segment::Field(_) => next.push((pointer, child)),
                    Segment::Each(_) => {
                        let items = child
                            .as_array()
                            .ok_or_else(|| PathError::NotAnArray(pointer.clone()))?;
                        next.extend(
                            items
                                .iter()
                                .enumerate()
                                .map(|(i, item)| (format!("{pointer}/{i}"), item)),
                        );
                    }
                }
            }
            cursor = next;
        }

        cursor
            .into_iter()
            .map(|(pointer, value)| match ResourceRef::from_value(value) {
                Some(reference) => Ok(Slot { pointer, reference }),
                None => Err(PathError::NotAStub(pointer)),
            })
            .collect()
    }
}

impl FromStr for FieldPath {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(|part| {
                let (name, each) = match part.strip_suffix("[]") {
                    Some(name) => (name, true),
                    None => (part, false),
                };
                if name.is_empty() || name.contains(['[', ']']) {
                    return Err(PlanError::InvalidPath(s.to_string()));
                }
                Ok(if each {
                    Segment::Each(name.to_string())
                } else {
                    Segment::Field(name.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Field(name) => f.write_str(name)?,
                Segment::Each(name) => write!(f, "{name}[]")?,
            }
        }
        Ok(())
    }
}

/// A located stub awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// JSON pointer of the stub within the document
    pub pointer: String,
    /// The stub itself
    pub reference: ResourceRef,
}

/// A named resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStep {
    name: String,
    target: FieldPath,
    after: Vec<String>,
}

impl ResolutionStep {
    fn fixed(name: &str, segments: Vec<Segment>, after: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            target: FieldPath { segments },
            after: after.iter().map(ToString::to_string).collect(),
        }
    }

    /// Step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field path the step resolves.
    #[must_use]
    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    /// Steps that must complete first.
    #[must_use]
    pub fn after(&self) -> &[String] {
        &self.after
    }
}

/// Validated, ordered set of resolution steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    steps: Vec<ResolutionStep>,
    stages: Vec<Vec<usize>>,
}

impl ResolutionPlan {
    /// Start an empty plan.
    #[must_use]
    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    /// The shipment plan: delivery location and master waybill, then the
    /// contained waybills. Party details stay unresolved.
    #[must_use]
    pub fn shipment() -> Self {
        Self {
            steps: Self::shipment_steps(),
            stages: vec![vec![0, 1], vec![2]],
        }
    }

    /// The shipment plan with party details resolved as well.
    #[must_use]
    pub fn shipment_with_parties() -> Self {
        let mut steps = Self::shipment_steps();
        steps.push(ResolutionStep::fixed(
            PARTY_DETAILS,
            vec![
                Segment::Each("parties".to_string()),
                Segment::Field("partyDetails".to_string()),
            ],
            &[],
        ));
        Self {
            steps,
            stages: vec![vec![0, 1, 3], vec![2]],
        }
    }

    fn shipment_steps() -> Vec<ResolutionStep> {
        vec![
            ResolutionStep::fixed(
                DELIVERY_LOCATION,
                vec![Segment::Field("deliveryLocation".to_string())],
                &[],
            ),
            ResolutionStep::fixed(
                MASTER_WAYBILL,
                vec![Segment::Field("waybillNumber".to_string())],
                &[],
            ),
            ResolutionStep::fixed(
                CONTAINED_WAYBILLS,
                vec![
                    Segment::Field("waybillNumber".to_string()),
                    Segment::Each("containedWaybills".to_string()),
                ],
                &[MASTER_WAYBILL],
            ),
        ]
    }

    /// Steps in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[ResolutionStep] {
        &self.steps
    }

    /// Look up a step by name.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&ResolutionStep> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// Steps grouped into stages. Every step runs in the first stage after
    /// all of its dependencies; steps within a stage are independent.
    pub fn stages(&self) -> impl Iterator<Item = Vec<&ResolutionStep>> {
        self.stages
            .iter()
            .map(|stage| stage.iter().map(|&i| &self.steps[i]).collect())
    }
}

/// Collects steps and validates them into a [`ResolutionPlan`].
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    steps: Vec<(String, String, Vec<String>)>,
}

impl PlanBuilder {
    /// Append a step resolving `target` after the named steps.
    #[must_use]
    pub fn step(mut self, name: &str, target: &str, after: &[&str]) -> Self {
        self.steps.push((
            name.to_string(),
            target.to_string(),
            after.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    /// Validate the steps and compute execution stages.
    ///
    /// # Errors
    ///
    /// Returns error on an invalid path, a duplicate step name or target, a
    /// dependency on an unknown or later step, or a nested target without a
    /// dependency on its enclosing step.
    pub fn build(self) -> Result<ResolutionPlan, PlanError> {
        let mut steps: Vec<ResolutionStep> = Vec::with_capacity(self.steps.len());
        // Transitive dependencies of each step, by index.
        let mut ancestors: Vec<HashSet<usize>> = Vec::with_capacity(self.steps.len());
        let mut stage_of: Vec<usize> = Vec::with_capacity(self.steps.len());

        for (name, target, after) in self.steps {
            if steps.iter().any(|s| s.name == name) {
                return Err(PlanError::DuplicateStep(name));
            }
            let target: FieldPath = target.parse()?;
            if let Some(other) = steps.iter().find(|s| s.target == target) {
                return Err(PlanError::DuplicateTarget {
                    step: name,
                    other: other.name.clone(),
                });
            }

            let mut deps = HashSet::new();
            let mut stage = 0;
            for dep in &after {
                let index = steps
                    .iter()
                    .position(|s| s.name == *dep)
                    .ok_or_else(|| PlanError::UnknownDependency {
                        step: name.clone(),
                        dependency: dep.clone(),
                    })?;
                deps.insert(index);
                deps.extend(ancestors[index].iter().copied());
                stage = stage.max(stage_of[index] + 1);
            }

            for (index, other) in steps.iter().enumerate() {
                if target.is_beneath(&other.target) && !deps.contains(&index) {
                    return Err(PlanError::MissingOrdering {
                        step: name,
                        enclosing: other.name.clone(),
                    });
                }
                // An earlier step can never depend on a later one.
                if other.target.is_beneath(&target) {
                    return Err(PlanError::MissingOrdering {
                        step: other.name.clone(),
                        enclosing: name,
                    });
                }
            }

            ancestors.push(deps);
            stage_of.push(stage);
            steps.push(ResolutionStep {
                name,
                target,
                after,
            });
        }

        let stage_count = stage_of.iter().max().map_or(0, |max| max + 1);
        let mut stages = vec![Vec::new(); stage_count];
        for (index, stage) in stage_of.into_iter().enumerate() {
            stages[stage].push(index);
        }

        Ok(ResolutionPlan { steps, stages })
    }
}

fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

/// Errors in a plan definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Path does not follow the `field.field[].field` grammar
    #[error("invalid field path: {0:?}")]
    InvalidPath(String),
    /// Two steps share a name
    #[error("duplicate step: {0}")]
    DuplicateStep(String),
    /// Two steps resolve the same field
    #[error("step {step} resolves the same field as {other}")]
    DuplicateTarget {
        /// Later step
        step: String,
        /// Earlier step with the same target
        other: String,
    },
    /// Dependency names no earlier step
    #[error("step {step} depends on unknown or later step {dependency}")]
    UnknownDependency {
        /// Step declaring the dependency
        step: String,
        /// Missing dependency
        dependency: String,
    },
    /// Nested target not ordered after its enclosing step
    #[error("step {step} targets a field inside {enclosing} but does not run after it")]
    MissingOrdering {
        /// Nested step
        step: String,
        /// Step whose target encloses it
        enclosing: String,
    },
}

/// Errors locating slots in a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Field absent from the document
    #[error("missing field at {0}")]
    MissingField(String),
    /// Iterated field is not an array
    #[error("expected an array at {0}")]
    NotAnArray(String),
    /// Slot holds something other than an `{ "id": ... }` stub
    #[error("expected a resource stub at {0}")]
    NotAStub(String),
}
