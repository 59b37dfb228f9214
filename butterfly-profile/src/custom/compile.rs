//! Custom model compiler
//!
//! Resolves every name to an [`EvHandle`] and every enum literal to its index, so the
//! compiled rules are plain data. Validation runs over the whole document and returns
//! all issues at once.

use super::expr::{CmpOp, Expr, Literal, SyntaxError};
use super::{BaseValue, CustomModel, DistanceInfluence, EffectValue, Statement};
use crate::diagnostics::{null_sink, Diagnostic, DiagnosticKind, SharedSink};
use crate::ev::{Codec, EvHandle, Registry};
use std::fmt;
use thiserror::Error;

/// Part of the document an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    BaseSpeed,
    BasePriority,
    Speed,
    Priority,
    DistanceInfluence,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::BaseSpeed => "base_speed",
            Section::BasePriority => "base_priority",
            Section::Speed => "speed",
            Section::Priority => "priority",
            Section::DistanceInfluence => "distance_influence",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    MissingBaseSpeed,
    Syntax(SyntaxError),
    UnknownAttribute {
        name: String,
        suggestion: Option<String>,
    },
    /// `expected` describes the use, `actual` the declared kind
    KindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    UnknownEnumValue {
        name: String,
        value: String,
        suggestion: Option<String>,
    },
    OutOfRange {
        name: String,
        value: f64,
    },
    InvalidConstant(String),
    NegativeFactor(f64),
    /// `else_if`/`else` without a preceding `if`
    DanglingBranch,
    /// Not exactly one of `if`/`else_if`/`else`
    AmbiguousBranch,
    MissingEffect,
    MultipleEffects,
    EffectNotAllowed(&'static str),
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingBaseSpeed => f.write_str("base_speed is required"),
            IssueKind::Syntax(err) => write!(f, "{err}"),
            IssueKind::UnknownAttribute { name, suggestion } => {
                write!(f, "unknown encoded value '{name}'")?;
                if let Some(s) = suggestion {
                    write!(f, ", did you mean '{s}'?")?;
                }
                Ok(())
            }
            IssueKind::KindMismatch { name, expected, actual } => {
                write!(f, "'{name}' is {actual}, expected {expected}")
            }
            IssueKind::UnknownEnumValue { name, value, suggestion } => {
                write!(f, "'{value}' is not a value of '{name}'")?;
                if let Some(s) = suggestion {
                    write!(f, ", did you mean '{s}'?")?;
                }
                Ok(())
            }
            IssueKind::OutOfRange { name, value } => write!(f, "{value} is out of range for '{name}'"),
            IssueKind::InvalidConstant(text) => write!(f, "'{text}' is not a finite number"),
            IssueKind::NegativeFactor(v) => write!(f, "multiply_by must not be negative, got {v}"),
            IssueKind::DanglingBranch => f.write_str("else_if/else without a preceding if"),
            IssueKind::AmbiguousBranch => f.write_str("a statement needs exactly one of if, else_if, else"),
            IssueKind::MissingEffect => f.write_str("statement has no effect"),
            IssueKind::MultipleEffects => f.write_str("statement has more than one effect"),
            IssueKind::EffectNotAllowed(effect) => write!(f, "'{effect}' is not allowed here"),
        }
    }
}

/// One validation problem
#[derive(Debug, Clone, PartialEq)]
pub struct ModelIssue {
    pub section: Section,
    /// Statement index within the section
    pub statement: Option<usize>,
    pub kind: IssueKind,
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.statement {
            Some(i) => write!(f, "{}[{}]: {}", self.section.as_str(), i, self.kind),
            None => write!(f, "{}: {}", self.section.as_str(), self.kind),
        }
    }
}

/// Every issue found in a document
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid custom model ({} issue(s)): {}", .issues.len(), join_issues(.issues))]
pub struct ModelValidationError {
    pub issues: Vec<ModelIssue>,
}

impl ModelValidationError {
    /// Names of unknown encoded values, in document order
    pub fn unknown_attributes(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match &issue.kind {
                IssueKind::UnknownAttribute { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn join_issues(issues: &[ModelIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

/// Compiled condition over handles
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Const(bool),
    Bool { handle: EvHandle, expected: bool },
    Number { handle: EvHandle, op: CmpOp, value: f64 },
    NumberIn { handle: EvHandle, values: Box<[f64]> },
    /// `table[index]` tells whether the enum index matches
    EnumIn { handle: EvHandle, table: Box<[bool]> },
    Not(Box<Predicate>),
    And(Box<[Predicate]>),
    Or(Box<[Predicate]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Branch {
    If,
    ElseIf,
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Effect {
    Multiply(f64),
    Limit(f64),
    AtLeast(f64),
    Set(f64),
    Add(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rule {
    pub(crate) branch: Branch,
    pub(crate) predicate: Predicate,
    pub(crate) effect: Effect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Base {
    Const(f64),
    Attribute(EvHandle),
}

/// Immutable evaluator bound to one registry layout
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    pub(crate) base_speed: Base,
    pub(crate) base_priority: Base,
    pub(crate) speed: Box<[Rule]>,
    pub(crate) priority: Box<[Rule]>,
    pub(crate) distance_base: f64,
    pub(crate) distance: Box<[Rule]>,
    pub(crate) registry_fingerprint: u64,
    pub(crate) words_per_edge: usize,
}

impl CompiledModel {
    /// Fingerprint of the registry the model was compiled against
    pub fn registry_fingerprint(&self) -> u64 {
        self.registry_fingerprint
    }

    /// Whether flags laid out by `registry` can be evaluated
    pub fn is_compatible(&self, registry: &Registry) -> bool {
        registry.fingerprint() == self.registry_fingerprint
    }

    pub fn words_per_edge(&self) -> usize {
        self.words_per_edge
    }

    /// Total number of compiled statements
    pub fn rule_count(&self) -> usize {
        self.speed.len() + self.priority.len() + self.distance.len()
    }
}

/// Compile against `registry`, discarding diagnostics
pub fn compile(model: &CustomModel, registry: &Registry) -> Result<CompiledModel, ModelValidationError> {
    CustomModelCompiler::new(registry, null_sink()).compile(model)
}

/// Compiles documents against one registry
pub struct CustomModelCompiler<'r> {
    registry: &'r Registry,
    sink: SharedSink,
}

/// Issue collector for one compilation
struct Issues {
    section: Section,
    statement: Option<usize>,
    found: Vec<ModelIssue>,
}

impl Issues {
    fn push(&mut self, kind: IssueKind) {
        self.found.push(ModelIssue {
            section: self.section,
            statement: self.statement,
            kind,
        });
    }

    fn at(&mut self, section: Section, statement: Option<usize>) {
        self.section = section;
        self.statement = statement;
    }
}

/// Report a numeric literal the value can never hold
fn check_storable(name: &str, handle: EvHandle, value: f64, issues: &mut Issues) -> Option<()> {
    let storable = match handle.codec() {
        Codec::Int { max } => value >= 0.0 && value <= max as f64,
        Codec::Decimal {
            factor, max_is_infinity, ..
        } => {
            // bounds are multiples of `factor`; allow for rounding in their product
            let slack = factor * 1e-6;
            (value >= handle.min_decimal() - slack && value <= handle.max_decimal() + slack)
                || (max_is_infinity && value == f64::INFINITY)
        }
        _ => true,
    };
    if !storable {
        issues.push(IssueKind::OutOfRange {
            name: name.to_string(),
            value,
        });
        return None;
    }
    Some(())
}

impl<'r> CustomModelCompiler<'r> {
    pub fn new(registry: &'r Registry, sink: SharedSink) -> Self {
        Self { registry, sink }
    }

    pub fn compile(&self, model: &CustomModel) -> Result<CompiledModel, ModelValidationError> {
        let mut issues = Issues {
            section: Section::BaseSpeed,
            statement: None,
            found: Vec::new(),
        };

        let base_speed = match &model.base_speed {
            Some(base) => self.base(base, &mut issues),
            None => {
                issues.push(IssueKind::MissingBaseSpeed);
                None
            }
        };
        issues.at(Section::BasePriority, None);
        let base_priority = match &model.base_priority {
            Some(base) => self.base(base, &mut issues),
            None => Some(Base::Const(1.0)),
        };

        let speed = self.statements(Section::Speed, &model.speed, &mut issues);
        let priority = self.statements(Section::Priority, &model.priority, &mut issues);
        let (distance_base, distance) = match &model.distance_influence {
            None => (0.0, Vec::new()),
            Some(DistanceInfluence::Constant(value)) => {
                issues.at(Section::DistanceInfluence, None);
                if !value.is_finite() || *value < 0.0 {
                    issues.push(IssueKind::OutOfRange {
                        name: Section::DistanceInfluence.as_str().to_string(),
                        value: *value,
                    });
                }
                (*value, Vec::new())
            }
            Some(DistanceInfluence::Rules(rules)) => {
                (0.0, self.statements(Section::DistanceInfluence, rules, &mut issues))
            }
        };

        if !issues.found.is_empty() {
            for issue in &issues.found {
                self.sink
                    .report(Diagnostic::new(DiagnosticKind::ModelIssue, issue.to_string()));
            }
            return Err(ModelValidationError { issues: issues.found });
        }

        let (Some(base_speed), Some(base_priority)) = (base_speed, base_priority) else {
            // a missing base always records an issue above
            return Err(ModelValidationError { issues: Vec::new() });
        };

        let compiled = CompiledModel {
            base_speed,
            base_priority,
            speed: speed.into_boxed_slice(),
            priority: priority.into_boxed_slice(),
            distance_base,
            distance: distance.into_boxed_slice(),
            registry_fingerprint: self.registry.fingerprint(),
            words_per_edge: self.registry.words_per_edge(),
        };
        tracing::debug!(
            speed_rules = compiled.speed.len(),
            priority_rules = compiled.priority.len(),
            distance_rules = compiled.distance.len(),
            "custom model compiled"
        );
        Ok(compiled)
    }

    fn resolve(&self, name: &str, issues: &mut Issues) -> Option<EvHandle> {
        if self.registry.contains(name) {
            self.registry.resolve(name).ok()
        } else {
            issues.push(IssueKind::UnknownAttribute {
                name: name.to_string(),
                suggestion: butterfly_common::suggest_correction(name, self.registry.names()),
            });
            None
        }
    }

    fn base(&self, base: &BaseValue, issues: &mut Issues) -> Option<Base> {
        match base {
            BaseValue::Number(value) => {
                if value.is_finite() && *value >= 0.0 {
                    Some(Base::Const(*value))
                } else {
                    issues.push(IssueKind::OutOfRange {
                        name: issues.section.as_str().to_string(),
                        value: *value,
                    });
                    None
                }
            }
            BaseValue::Attribute(name) => {
                let handle = self.resolve(name, issues)?;
                match handle.codec() {
                    Codec::Decimal {
                        max_is_infinity: true, ..
                    } => {
                        issues.push(IssueKind::KindMismatch {
                            name: name.clone(),
                            expected: "a finite number",
                            actual: "unbounded decimal",
                        });
                        None
                    }
                    Codec::Int { .. } | Codec::Decimal { .. } => Some(Base::Attribute(handle)),
                    other => {
                        issues.push(IssueKind::KindMismatch {
                            name: name.clone(),
                            expected: "a number",
                            actual: other.kind_name(),
                        });
                        None
                    }
                }
            }
        }
    }

    fn statements(&self, section: Section, statements: &[Statement], issues: &mut Issues) -> Vec<Rule> {
        let mut rules = Vec::with_capacity(statements.len());
        let mut open_block = false;

        for (index, statement) in statements.iter().enumerate() {
            issues.at(section, Some(index));

            let branch = match (&statement.if_, &statement.else_if, &statement.else_) {
                (Some(condition), None, None) => Some((Branch::If, condition.as_str())),
                (None, Some(condition), None) => Some((Branch::ElseIf, condition.as_str())),
                (None, None, Some(_)) => Some((Branch::Else, "true")),
                _ => {
                    issues.push(IssueKind::AmbiguousBranch);
                    None
                }
            };
            if let Some((kind, _)) = branch {
                if kind != Branch::If && !open_block {
                    issues.push(IssueKind::DanglingBranch);
                }
                open_block = kind != Branch::Else;
            }

            let predicate = branch.and_then(|(_, condition)| match Expr::parse(condition) {
                Ok(expr) => self.predicate(&expr, issues),
                Err(err) => {
                    issues.push(IssueKind::Syntax(err));
                    None
                }
            });
            let effect = self.effect(section, statement, issues);

            if let (Some((branch, _)), Some(predicate), Some(effect)) = (branch, predicate, effect) {
                rules.push(Rule {
                    branch,
                    predicate,
                    effect,
                });
            }
        }
        rules
    }

    fn effect(&self, section: Section, statement: &Statement, issues: &mut Issues) -> Option<Effect> {
        let candidates: [(&'static str, &Option<EffectValue>, fn(f64) -> Effect); 5] = [
            ("multiply_by", &statement.multiply_by, Effect::Multiply),
            ("limit_to", &statement.limit_to, Effect::Limit),
            ("at_least", &statement.at_least, Effect::AtLeast),
            ("set_to", &statement.set_to, Effect::Set),
            ("add", &statement.add, Effect::Add),
        ];
        let mut present = candidates.iter().filter(|(_, value, _)| value.is_some());
        let Some(&(name, value, make)) = present.next() else {
            issues.push(IssueKind::MissingEffect);
            return None;
        };
        if present.next().is_some() {
            issues.push(IssueKind::MultipleEffects);
            return None;
        }
        if name == "add" && section != Section::DistanceInfluence {
            issues.push(IssueKind::EffectNotAllowed(name));
            return None;
        }

        let number = match value.as_ref()? {
            EffectValue::Number(n) => Some(*n),
            EffectValue::Text(text) => text.trim().parse::<f64>().ok(),
        };
        let Some(number) = number.filter(|n| n.is_finite()) else {
            let text = match value.as_ref()? {
                EffectValue::Number(n) => n.to_string(),
                EffectValue::Text(t) => t.clone(),
            };
            issues.push(IssueKind::InvalidConstant(text));
            return None;
        };

        if name == "multiply_by" && number < 0.0 {
            issues.push(IssueKind::NegativeFactor(number));
            return None;
        }
        if name != "multiply_by" && name != "add" && number < 0.0 {
            issues.push(IssueKind::OutOfRange {
                name: name.to_string(),
                value: number,
            });
            return None;
        }
        Some(make(number))
    }

    fn predicate(&self, expr: &Expr, issues: &mut Issues) -> Option<Predicate> {
        match expr {
            Expr::Const(value) => Some(Predicate::Const(*value)),
            Expr::Not(inner) => Some(Predicate::Not(Box::new(self.predicate(inner, issues)?))),
            Expr::And(terms) | Expr::Or(terms) => {
                // every term is checked so every issue is reported
                let compiled: Vec<_> = terms.iter().map(|t| self.predicate(t, issues)).collect();
                let compiled: Box<[Predicate]> = compiled.into_iter().collect::<Option<_>>()?;
                Some(match expr {
                    Expr::And(_) => Predicate::And(compiled),
                    _ => Predicate::Or(compiled),
                })
            }
            Expr::Attr { name, .. } => {
                let handle = self.resolve(name, issues)?;
                match handle.codec() {
                    Codec::Bool => Some(Predicate::Bool { handle, expected: true }),
                    other => {
                        issues.push(IssueKind::KindMismatch {
                            name: name.clone(),
                            expected: "a boolean condition",
                            actual: other.kind_name(),
                        });
                        None
                    }
                }
            }
            Expr::Compare { name, op, value, .. } => {
                let handle = self.resolve(name, issues)?;
                self.compare(name, handle, *op, value, issues)
            }
            Expr::In { name, values, .. } => {
                let handle = self.resolve(name, issues)?;
                self.membership(name, handle, values, issues)
            }
        }
    }

    fn compare(
        &self,
        name: &str,
        handle: EvHandle,
        op: CmpOp,
        value: &Literal,
        issues: &mut Issues,
    ) -> Option<Predicate> {
        let mismatch = |issues: &mut Issues, expected: &'static str| {
            issues.push(IssueKind::KindMismatch {
                name: name.to_string(),
                expected,
                actual: handle.codec().kind_name(),
            });
            None
        };

        match (handle.codec(), value) {
            (Codec::Bool, Literal::Bool(b)) if !op.is_ordering() => Some(Predicate::Bool {
                handle,
                expected: *b == (op == CmpOp::Eq),
            }),
            (Codec::Bool, _) => mismatch(issues, "'== true' or '== false'"),
            (Codec::Enum { .. }, Literal::Name(literal)) if !op.is_ordering() => {
                let table = self.enum_table(name, handle, std::slice::from_ref(literal), issues)?;
                let predicate = Predicate::EnumIn { handle, table };
                Some(if op == CmpOp::Ne {
                    Predicate::Not(Box::new(predicate))
                } else {
                    predicate
                })
            }
            (Codec::Enum { .. }, _) => mismatch(issues, "'==' or '!=' with a value name"),
            (Codec::Int { .. } | Codec::Decimal { .. }, Literal::Number(n)) => {
                check_storable(name, handle, *n, issues)?;
                Some(Predicate::Number { handle, op, value: *n })
            }
            (Codec::Int { .. } | Codec::Decimal { .. }, _) => mismatch(issues, "a numeric comparison"),
        }
    }

    fn membership(
        &self,
        name: &str,
        handle: EvHandle,
        values: &[Literal],
        issues: &mut Issues,
    ) -> Option<Predicate> {
        match handle.codec() {
            Codec::Enum { .. } => {
                let names: Option<Vec<String>> = values
                    .iter()
                    .map(|v| match v {
                        Literal::Name(n) => Some(n.clone()),
                        _ => None,
                    })
                    .collect();
                let Some(names) = names else {
                    issues.push(IssueKind::KindMismatch {
                        name: name.to_string(),
                        expected: "a list of value names",
                        actual: "enum",
                    });
                    return None;
                };
                let table = self.enum_table(name, handle, &names, issues)?;
                Some(Predicate::EnumIn { handle, table })
            }
            Codec::Int { .. } | Codec::Decimal { .. } => {
                let numbers: Option<Vec<f64>> = values
                    .iter()
                    .map(|v| match v {
                        Literal::Number(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                match numbers {
                    Some(numbers) => {
                        let mut storable = true;
                        for n in &numbers {
                            storable &= check_storable(name, handle, *n, issues).is_some();
                        }
                        storable.then(|| Predicate::NumberIn {
                            handle,
                            values: numbers.into_boxed_slice(),
                        })
                    }
                    None => {
                        issues.push(IssueKind::KindMismatch {
                            name: name.to_string(),
                            expected: "a list of numbers",
                            actual: handle.codec().kind_name(),
                        });
                        None
                    }
                }
            }
            Codec::Bool => {
                issues.push(IssueKind::KindMismatch {
                    name: name.to_string(),
                    expected: "'== true' or '== false'",
                    actual: "boolean",
                });
                None
            }
        }
    }

    fn enum_table(
        &self,
        name: &str,
        handle: EvHandle,
        literals: &[String],
        issues: &mut Issues,
    ) -> Option<Box<[bool]>> {
        let declared = self.registry.enum_values(&handle)?;
        let mut table = vec![false; declared.len()];
        let mut complete = true;
        for literal in literals {
            match self.registry.enum_index(&handle, literal) {
                Some(index) => table[index as usize] = true,
                None => {
                    complete = false;
                    issues.push(IssueKind::UnknownEnumValue {
                        name: name.to_string(),
                        value: literal.clone(),
                        suggestion: butterfly_common::suggest_correction(&literal.to_ascii_uppercase(), declared),
                    });
                }
            }
        }
        complete.then(|| table.into_boxed_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::Statement;
    use crate::diagnostics::CollectingSink;
    use crate::ev::StandardValues;
    use crate::mode::Mode;
    use std::sync::Arc;

    fn registry() -> Registry {
        let mut registry = Registry::new(4);
        StandardValues::declare(&mut registry, Mode::all()).unwrap();
        registry.finalize();
        registry
    }

    fn model() -> CustomModel {
        CustomModel::new().with_base_speed(BaseValue::Attribute("foot_average_speed".into()))
    }

    fn issues(model: &CustomModel) -> Vec<IssueKind> {
        compile(model, &registry())
            .unwrap_err()
            .issues
            .into_iter()
            .map(|i| i.kind)
            .collect()
    }

    #[test]
    fn test_valid_model_compiles() {
        let model = model()
            .add_priority(Statement::if_("road_class == track").multiply_by(0.8))
            .add_priority(Statement::else_if("road_class in [PATH, FOOTWAY] && !car_access").multiply_by(1.0))
            .add_priority(Statement::else_().limit_to(0.9))
            .add_speed(Statement::if_("max_speed < 30 || hike_rating >= 3").limit_to(4.0));
        let registry = registry();
        let compiled = compile(&model, &registry).unwrap();
        assert_eq!(compiled.rule_count(), 4);
        assert!(compiled.is_compatible(&registry));
        assert_eq!(compiled.words_per_edge(), 4);
    }

    #[test]
    fn test_unknown_attribute_is_named() {
        let model = model().add_priority(Statement::if_("road_clas == TRACK").multiply_by(0.5));
        let err = compile(&model, &registry()).unwrap_err();
        assert_eq!(err.unknown_attributes(), vec!["road_clas"]);
        assert!(err.to_string().contains("road_clas"));
        assert!(err.to_string().contains("did you mean 'road_class'"));
    }

    #[test]
    fn test_all_issues_are_collected() {
        let model = CustomModel::new()
            .add_priority(Statement::if_("surface == LAVA").multiply_by(0.5))
            .add_priority(Statement::if_("max_speed == FAST").multiply_by(-1.0))
            .add_speed(Statement::else_().limit_to(10.0))
            .add_speed(Statement::if_("road_class ==").set_to(5.0));
        let kinds = issues(&model);
        assert_eq!(kinds.len(), 6, "{kinds:?}");
        assert_eq!(kinds[0], IssueKind::MissingBaseSpeed);
        assert!(matches!(kinds[1], IssueKind::UnknownEnumValue { .. }));
        assert!(matches!(kinds[2], IssueKind::KindMismatch { .. }));
        assert_eq!(kinds[3], IssueKind::NegativeFactor(-1.0));
        assert_eq!(kinds[4], IssueKind::DanglingBranch);
        assert!(matches!(kinds[5], IssueKind::Syntax(_)));
    }

    #[test]
    fn test_statement_shape_issues() {
        let two_effects = Statement::if_("true").multiply_by(0.5).limit_to(1.0);
        let no_effect = Statement::if_("true");
        let mut two_branches = Statement::if_("true").multiply_by(0.5);
        two_branches.else_if = Some("false".into());
        let add_in_priority = Statement::if_("true").add(1.0);
        let text = Statement::if_("true").multiply_by(EffectValue::Text("lots".into()));

        let model = model()
            .add_priority(two_effects)
            .add_priority(no_effect)
            .add_priority(two_branches)
            .add_priority(add_in_priority)
            .add_priority(text);
        assert_eq!(
            issues(&model),
            vec![
                IssueKind::MultipleEffects,
                IssueKind::MissingEffect,
                IssueKind::AmbiguousBranch,
                IssueKind::EffectNotAllowed("add"),
                IssueKind::InvalidConstant("lots".into()),
            ]
        );
    }

    #[test]
    fn test_kind_checks() {
        let model = model()
            .add_priority(Statement::if_("road_class").multiply_by(0.5))
            .add_priority(Statement::if_("car_access > 1").multiply_by(0.5))
            .add_priority(Statement::if_("hike_rating == 9").multiply_by(0.5))
            .add_priority(Statement::if_("road_class < 3").multiply_by(0.5))
            .add_priority(Statement::if_("hike_rating in [2, 9]").multiply_by(0.5))
            .add_priority(Statement::if_("max_speed < -5").multiply_by(0.5))
            .add_priority(Statement::if_("foot_priority > 40").multiply_by(0.5))
            .add_priority(Statement::if_("max_speed in [300, 50]").multiply_by(0.5));
        let kinds = issues(&model);
        assert_eq!(kinds.len(), 8, "{kinds:?}");
        let out_of_range: Vec<_> = kinds
            .iter()
            .filter_map(|k| match k {
                IssueKind::OutOfRange { name, value } => Some((name.as_str(), *value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            out_of_range,
            vec![
                ("hike_rating", 9.0),
                ("hike_rating", 9.0),
                ("max_speed", -5.0),
                ("foot_priority", 40.0),
                ("max_speed", 300.0),
            ]
        );
    }

    #[test]
    fn test_bounds_of_stored_ranges_are_accepted() {
        let model = model()
            .add_priority(Statement::if_("foot_priority >= 1.5 || foot_priority <= 0").multiply_by(0.5))
            .add_priority(Statement::if_("hike_rating in [0, 7]").multiply_by(0.5))
            .add_speed(Statement::if_("max_speed == 252").limit_to(4.0));
        assert!(compile(&model, &registry()).is_ok());
    }

    #[test]
    fn test_long_conditions_compile_without_recursion_per_term() {
        let condition = vec!["road_class == TRACK"; 3_000].join(" && ");
        let chained = model().add_priority(Statement::if_(condition).multiply_by(0.5));
        let compiled = compile(&chained, &registry()).unwrap();
        assert_eq!(compiled.rule_count(), 1);
        let flags = vec![0u32; compiled.words_per_edge()];
        assert_eq!(compiled.evaluate(&flags, crate::ev::Direction::Forward).priority, 1.0);

        let condition = vec!["surfce == GRAVEL"; 2_000].join(" || ");
        let misspelled = model().add_priority(Statement::if_(condition).multiply_by(0.5));
        let err = compile(&misspelled, &registry()).unwrap_err();
        assert_eq!(err.issues.len(), 2_000);
    }

    #[test]
    fn test_base_values() {
        let enum_base = CustomModel::new().with_base_speed(BaseValue::Attribute("road_class".into()));
        assert!(matches!(issues(&enum_base)[0], IssueKind::KindMismatch { .. }));

        let unbounded = CustomModel::new().with_base_speed(BaseValue::Attribute("max_speed".into()));
        assert!(matches!(
            &issues(&unbounded)[0],
            IssueKind::KindMismatch { name, expected: "a finite number", .. } if name == "max_speed"
        ));

        let negative = CustomModel::new().with_base_speed(BaseValue::Number(-3.0));
        assert!(matches!(issues(&negative)[0], IssueKind::OutOfRange { .. }));

        let add_allowed = model().with_distance_influence(DistanceInfluence::Rules(vec![
            Statement::if_("road_class == MOTORWAY").add(20.0),
        ]));
        assert!(compile(&add_allowed, &registry()).is_ok());
    }

    #[test]
    fn test_issues_reach_the_sink() {
        let registry = registry();
        let sink = Arc::new(CollectingSink::new());
        let compiler = CustomModelCompiler::new(&registry, sink.clone());
        let model = model().add_priority(Statement::if_("nope").multiply_by(0.5));
        assert!(compiler.compile(&model).is_err());
        assert_eq!(sink.count(DiagnosticKind::ModelIssue), 1);
    }
}
