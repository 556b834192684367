use criterion::{criterion_group, criterion_main, Criterion};
use search_core::config::CorrectionParams;
use search_core::corrector::SpellingCorrector;
use search_core::lexicon::Lexicon;
use search_core::parser::parse_query;
use search_core::tokenizer::tokenize;

const TEXT: &str = "Les chercheurs du laboratoire Chrono-Environnement de Besançon étudient \
    la cuisine moléculaire, les nanotechnologies et les systèmes embarqués pour l'aéronautique.";

fn lexicon() -> Lexicon {
    let words: Vec<String> = tokenize(TEXT).into_iter().cycle().take(2_000).enumerate().map(|(i, w)| format!("{w}{i}")).collect();
    Lexicon::from_stemmer(words.iter().chain(tokenize(TEXT).iter()))
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_sentence", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_correct(c: &mut Criterion) {
    let lex = lexicon();
    let corrector = SpellingCorrector::new(&lex, CorrectionParams::default());
    c.bench_function("correct_exact", |b| b.iter(|| corrector.correct("cuisine moléculaire")));
    c.bench_function("correct_fuzzy", |b| b.iter(|| corrector.correct("nanotechnolojies aeronotique")));
}

fn bench_parse(c: &mut Criterion) {
    let q = "Je voudrais tous les bulletins écrits entre 2012 et 2013 mais pas au mois de juin.";
    c.bench_function("parse_query", |b| b.iter(|| parse_query(q)));
}

criterion_group!(benches, bench_tokenize, bench_correct, bench_parse);
criterion_main!(benches);
