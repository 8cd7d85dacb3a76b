//! Randomized property tests for the call-site and declaration rules.
//!
//! Call cases draw a target signature, which arguments are passed (positional
//! until the first skipped parameter, named after it) and whether a
//! token-taking sibling overload exists. Declaration cases draw a return
//! shape and a parameter list.

use std::env;

use cancel_lint_core::edit::apply_batch;
use cancel_lint_core::model::{
    Compilation, CompilationBuilder, DocumentBuilder, MethodSymbol, ParameterSymbol, TypeId,
};
use cancel_lint_core::{
    Analyzer, CancellationFlag, Config, DocumentId, ExternalDiagnostic, FileContext, Rule,
    SUPPRESS_OVERLAP,
};
use cancel_lint_rules::{analyzer_builder, evaluate_invocation, preferred, EditGenerator, MissingTokenInvocation};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence, RngAlgorithm, RngSeed};

fn property_cases() -> u32 {
    env::var("CANCEL_LINT_PROPTEST_CASES")
        .ok()
        .or_else(|| env::var("PROPTEST_CASES").ok())
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(128)
}

fn proptest_config(source_file: &'static str) -> ProptestConfig {
    ProptestConfig {
        cases: property_cases(),
        source_file: Some(source_file),
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "proptest-regressions",
        ))),
        rng_algorithm: RngAlgorithm::ChaCha,
        rng_seed: RngSeed::Fixed(0xCA2_016),
        ..ProptestConfig::default()
    }
}

// ── Call cases ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Int,
    OptionalInt,
    Token,
    OptionalToken,
}

impl ParamKind {
    fn is_token(self) -> bool {
        matches!(self, Self::Token | Self::OptionalToken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Passed {
    Omitted,
    Value,
    RealToken,
    NoneSentinel,
}

#[derive(Debug, Clone)]
struct CallCase {
    parameters: Vec<ParamKind>,
    passed: Vec<Passed>,
    named: Vec<bool>,
    with_overload: bool,
}

impl CallCase {
    fn parameter_name(&self, index: usize) -> String {
        if self.parameters[index].is_token() {
            format!("ct{index}")
        } else {
            format!("p{index}")
        }
    }

    /// The call text and, per emitted argument, what it passes.
    fn call(&self) -> (String, Vec<Passed>) {
        let mut skipped = false;
        let mut arguments = Vec::new();
        let mut kinds = Vec::new();
        for (i, passed) in self.passed.iter().enumerate() {
            let expression = match passed {
                Passed::Omitted => {
                    skipped = true;
                    continue;
                }
                Passed::Value => "1",
                Passed::RealToken => "token",
                Passed::NoneSentinel => "CancellationToken.None",
            };
            if skipped || self.named[i] {
                arguments.push(format!("{}: {expression}", self.parameter_name(i)));
            } else {
                arguments.push(expression.to_string());
            }
            kinds.push(*passed);
        }
        (format!("Target({});", arguments.join(", ")), kinds)
    }

    /// The diagnostic code the call should get, worked out from the case alone.
    fn expected_code(&self) -> Option<&'static str> {
        let tokens: Vec<Passed> = self
            .parameters
            .iter()
            .zip(&self.passed)
            .filter(|(kind, passed)| kind.is_token() && **passed != Passed::Omitted)
            .map(|(_, passed)| *passed)
            .collect();
        if !tokens.is_empty() {
            return tokens.contains(&Passed::NoneSentinel).then_some("CT003");
        }
        if self.parameters.contains(&ParamKind::OptionalToken) {
            return Some("CT004");
        }
        self.with_overload.then_some("CT005")
    }

    fn none_arguments(&self) -> usize {
        self.passed.iter().filter(|p| **p == Passed::NoneSentinel).count()
    }

    fn compilation(&self, ca2016: bool) -> Compilation {
        let mut b = CompilationBuilder::with_system_types();
        let ct = system(&b, "System.Threading.CancellationToken");
        let int = system(&b, "System.Int32");
        let task = system(&b, "System.Threading.Tasks.Task");
        let class = b.class("Worker");

        let mut target = MethodSymbol::new("Target", class, Some(task));
        for (i, kind) in self.parameters.iter().enumerate() {
            let name = self.parameter_name(i);
            target = target.param(match kind {
                ParamKind::Int => ParameterSymbol::new(&name, int),
                ParamKind::OptionalInt => ParameterSymbol::optional(&name, int),
                ParamKind::Token => ParameterSymbol::new(&name, ct),
                ParamKind::OptionalToken => ParameterSymbol::optional(&name, ct),
            });
        }
        let overload = self
            .with_overload
            .then(|| target.clone().param(ParameterSymbol::new("cancellationToken", ct)));
        let target = b.add_method(target);
        if let Some(overload) = overload {
            let _ = b.add_method(overload);
        }

        let (text, kinds) = self.call();
        let mut doc = DocumentBuilder::new("Worker.cs", &text);
        let mut call = doc.invoke("Target", Some(target));
        for (position, kind) in kinds.iter().enumerate() {
            call = match kind {
                Passed::Value => call.argument_type(position, int),
                Passed::RealToken => call.argument_type(position, ct),
                Passed::NoneSentinel => call.none_sentinel(position, ct),
                Passed::Omitted => call,
            };
        }
        let _ = call.index();
        let document = doc.build().expect("document should build");
        let span = document.invocations[0].span;
        b.add_document(document);
        if ca2016 {
            b.external_diagnostic(ExternalDiagnostic {
                id: "CA2016".to_string(),
                document: DocumentId(0),
                span,
                message: String::new(),
            });
        }
        b.build().expect("compilation should build")
    }
}

fn system(b: &CompilationBuilder, name: &str) -> TypeId {
    b.type_id(name).expect("system type should exist")
}

fn param_kind_strategy() -> impl Strategy<Value = ParamKind> {
    prop_oneof![
        Just(ParamKind::Int),
        Just(ParamKind::OptionalInt),
        Just(ParamKind::Token),
        Just(ParamKind::OptionalToken),
    ]
}

fn passed_strategy(kind: ParamKind) -> BoxedStrategy<Passed> {
    if kind.is_token() {
        prop_oneof![
            Just(Passed::Omitted),
            Just(Passed::RealToken),
            Just(Passed::NoneSentinel),
        ]
        .boxed()
    } else {
        prop_oneof![Just(Passed::Omitted), Just(Passed::Value)].boxed()
    }
}

fn call_case_strategy() -> impl Strategy<Value = CallCase> {
    prop::collection::vec(param_kind_strategy(), 0..5)
        .prop_flat_map(|parameters| {
            let passed: Vec<BoxedStrategy<Passed>> = parameters.iter().map(|k| passed_strategy(*k)).collect();
            let count = parameters.len();
            (
                Just(parameters),
                passed,
                prop::collection::vec(any::<bool>(), count),
                any::<bool>(),
            )
        })
        .prop_map(|(parameters, passed, named, with_overload)| CallCase {
            parameters,
            passed,
            named,
            with_overload,
        })
}

fn disabled_code_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("CT003")), Just(Some("CT004")), Just(Some("CT005"))]
}

// ── Declaration cases ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnShape {
    Task,
    TaskOfT,
    ValueTask,
    ValueTaskOfT,
    AsyncVoid,
}

impl ReturnShape {
    fn source(self) -> &'static str {
        match self {
            Self::Task => "async Task",
            Self::TaskOfT => "async Task<int>",
            Self::ValueTask => "async ValueTask",
            Self::ValueTaskOfT => "async ValueTask<int>",
            Self::AsyncVoid => "async void",
        }
    }

    fn return_type(self, b: &mut CompilationBuilder) -> TypeId {
        match self {
            Self::Task => system(b, "System.Threading.Tasks.Task"),
            Self::TaskOfT => {
                let task = system(b, "System.Threading.Tasks.Task`1");
                b.constructed(task, "System.Int32")
            }
            Self::ValueTask => system(b, "System.Threading.Tasks.ValueTask"),
            Self::ValueTaskOfT => {
                let value_task = system(b, "System.Threading.Tasks.ValueTask`1");
                b.constructed(value_task, "System.Int32")
            }
            Self::AsyncVoid => system(b, "System.Void"),
        }
    }

    fn code(self) -> &'static str {
        if self == Self::AsyncVoid {
            "CT002"
        } else {
            "CT001"
        }
    }
}

#[derive(Debug, Clone)]
struct DeclarationCase {
    shape: ReturnShape,
    /// Whether each `int` parameter has a default value.
    defaults: Vec<bool>,
}

impl DeclarationCase {
    fn source(&self) -> String {
        let parameters: Vec<String> = self
            .defaults
            .iter()
            .enumerate()
            .map(|(i, optional)| {
                if *optional {
                    format!("int p{i} = 0")
                } else {
                    format!("int p{i}")
                }
            })
            .collect();
        format!(
            "class Worker {{ {} RunAsync({}) {{ await Task.Yield(); }} }}",
            self.shape.source(),
            parameters.join(", ")
        )
    }

    fn compilation(&self, text: &str, with_token: bool) -> Compilation {
        let mut b = CompilationBuilder::with_system_types();
        let int = system(&b, "System.Int32");
        let ct = system(&b, "System.Threading.CancellationToken");
        let class = b.class("Worker");
        let ret = self.shape.return_type(&mut b);

        let mut symbol = MethodSymbol::new("RunAsync", class, Some(ret)).asynchronous();
        for (i, optional) in self.defaults.iter().enumerate() {
            let name = format!("p{i}");
            symbol = symbol.param(if *optional {
                ParameterSymbol::optional(&name, int)
            } else {
                ParameterSymbol::new(&name, int)
            });
        }
        if with_token {
            symbol = symbol.param(ParameterSymbol::optional("cancellationToken", ct));
        }
        let id = b.add_method(symbol);
        let mut doc = DocumentBuilder::new("Worker.cs", text);
        doc.declare(Some(id), "RunAsync");
        b.add_document(doc.build().expect("document should build"));
        b.build().expect("compilation should build")
    }
}

fn return_shape_strategy() -> impl Strategy<Value = ReturnShape> {
    prop_oneof![
        Just(ReturnShape::Task),
        Just(ReturnShape::TaskOfT),
        Just(ReturnShape::ValueTask),
        Just(ReturnShape::ValueTaskOfT),
        Just(ReturnShape::AsyncVoid),
    ]
}

fn declaration_case_strategy() -> impl Strategy<Value = DeclarationCase> {
    (return_shape_strategy(), prop::collection::vec(any::<bool>(), 0..4))
        .prop_map(|(shape, defaults)| DeclarationCase { shape, defaults })
}

// ── Helpers ──

fn analyzer(config: Config) -> Analyzer {
    analyzer_builder()
        .config(config)
        .build()
        .expect("analyzer should build")
}

/// Applies the preferred fix of every diagnostic in document 0.
fn fix_all(analyzer: &Analyzer, compilation: &Compilation) -> (String, Vec<String>) {
    let result = analyzer.analyze(compilation).expect("analysis should succeed");
    let ctx = analyzer.context(compilation).expect("context should build");
    let document = &compilation.documents[0];
    let file = FileContext::new(&ctx, DocumentId(0), document);
    let generator = EditGenerator::new();
    let cancel = CancellationFlag::new();

    let fixes: Vec<_> = result
        .diagnostics
        .iter()
        .filter_map(|d| {
            let offers = generator.offers(&file, d);
            preferred(&offers).map(|offer| {
                generator
                    .materialize(&file, offer, &cancel)
                    .expect("fix should materialize")
            })
        })
        .collect();
    let outcome = apply_batch(&document.text, &fixes).expect("batch should apply");
    (outcome.text, outcome.applied)
}

proptest! {
    #![proptest_config(proptest_config(file!()))]

    #[test]
    fn call_outcomes_are_exclusive(case in call_case_strategy()) {
        let compilation = case.compilation(false);
        let analysis = analyzer(Config::default()).context(&compilation).expect("context should build");
        let document = &compilation.documents[0];
        let ctx = FileContext::new(&analysis, DocumentId(0), document);
        let invocation = &document.invocations[0];

        let diagnostics = MissingTokenInvocation.check_invocation(&ctx, invocation);
        let codes: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        let expected = case.expected_code();

        prop_assert!(codes.windows(2).all(|w| w[0] == w[1]), "mixed outcomes {:?}", codes);
        prop_assert_eq!(codes.first().copied(), expected);
        prop_assert_eq!(
            evaluate_invocation(&analysis, invocation).map(|f| f.code()),
            expected
        );
        match expected {
            Some("CT003") => {
                prop_assert_eq!(codes.len(), case.none_arguments());
            }
            Some(_) => {
                prop_assert_eq!(codes.len(), 1);
            }
            None => {
                prop_assert!(codes.is_empty());
            }
        }
    }

    #[test]
    fn suppressor_agrees_with_reported_findings(
        case in call_case_strategy(),
        enabled in any::<bool>(),
        disabled in disabled_code_strategy(),
    ) {
        let compilation = case.compilation(true);
        let mut config = match disabled {
            Some(code) => Config::parse(&format!("[rules.{code}]\nenabled = false\n"))
                .expect("config should parse"),
            None => Config::new(),
        };
        config = config.with_option(SUPPRESS_OVERLAP, enabled);
        let analyzer = analyzer(config);
        let result = analyzer.analyze(&compilation).expect("analysis should succeed");

        let analysis = analyzer.context(&compilation).expect("context should build");
        let finding = evaluate_invocation(&analysis, &compilation.documents[0].invocations[0]);
        let reported = finding
            .as_ref()
            .map_or(false, |f| disabled != Some(f.code()));

        prop_assert_eq!(!result.diagnostics.is_empty(), reported);
        prop_assert_eq!(result.suppressions.len(), usize::from(enabled && reported));
    }

    #[test]
    fn declaration_fix_is_idempotent(case in declaration_case_strategy()) {
        let analyzer = analyzer(Config::default());
        let source = case.source();
        let before = case.compilation(&source, false);

        let found = analyzer.analyze(&before).expect("analysis should succeed").diagnostics;
        let codes: Vec<&str> = found.iter().map(|d| d.code.as_str()).collect();
        prop_assert_eq!(codes, [case.shape.code()]);

        let (fixed, applied) = fix_all(&analyzer, &before);
        prop_assert_eq!(applied, ["Add optional CancellationToken"]);
        prop_assert!(
            fixed.contains("System.Threading.CancellationToken cancellationToken = default) {"),
            "unexpected fix {}",
            fixed
        );

        let after = case.compilation(&fixed, true);
        prop_assert!(analyzer.analyze(&after).expect("analysis should succeed").diagnostics.is_empty());
        let (again, applied) = fix_all(&analyzer, &after);
        prop_assert!(applied.is_empty());
        prop_assert_eq!(again, fixed);
    }
}
