use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use event_editor_core::{
    CodeTable, Command, CommandExecutor, CommandList, EditCommand, EventCommand, FoldCommand,
    SearchCommand, SearchOptions, SelectionCommand, SharedClipboard, code,
    expand_selection_to_groups, resolve_group_range,
};
use serde_json::json;

// Repeats a nested block of 12 commands until roughly `target` commands are generated.
fn large_event(target: usize) -> Vec<EventCommand> {
    let mut commands = Vec::with_capacity(target + 12);
    let mut i = 0;
    while commands.len() < target {
        commands.extend([
            EventCommand::with_parameters(code::CONDITIONAL, 0, vec![json!(0), json!(i), json!(0)]),
            EventCommand::new(code::LOOP, 1),
            EventCommand::with_parameters(code::SHOW_TEXT, 2, vec![json!(""), json!(0)]),
            EventCommand::with_parameters(code::TEXT_LINE, 2, vec![json!(format!("line {i}"))]),
            EventCommand::with_parameters(code::TEXT_LINE, 2, vec![json!("the quick brown fox")]),
            EventCommand::new(code::BREAK_LOOP, 2),
            EventCommand::new(code::REPEAT_ABOVE, 1),
            EventCommand::new(code::ELSE, 0),
            EventCommand::with_parameters(122, 1, vec![json!(1), json!(i)]),
            EventCommand::new(code::CONDITIONAL_END, 0),
            EventCommand::with_parameters(code::COMMENT, 0, vec![json!(format!("note {i}"))]),
            EventCommand::new(code::EXIT_EVENT, 0),
        ]);
        i += 1;
    }
    commands.push(EventCommand::placeholder(0));
    commands
}

fn executor(commands: &[EventCommand]) -> CommandExecutor {
    CommandExecutor::new(CommandList::new(commands.to_vec())).with_clipboard(SharedClipboard::new())
}

fn bench_group_resolution(c: &mut Criterion) {
    let table = CodeTable::standard();
    let commands = large_event(3_000);
    c.bench_function("resolve_group_range/3k_all_indices", |b| {
        b.iter(|| {
            for index in 0..commands.len() {
                black_box(resolve_group_range(black_box(&commands), index, &table));
            }
        })
    });
}

fn bench_selection_expansion(c: &mut Criterion) {
    let table = CodeTable::standard();
    let commands = large_event(3_000);
    c.bench_function("expand_selection/3k_every_third", |b| {
        b.iter(|| {
            let ranges = expand_selection_to_groups(
                black_box(&commands),
                (0..commands.len()).step_by(3),
                &table,
            );
            black_box(ranges.len());
        })
    });
}

fn bench_hidden_indices(c: &mut Criterion) {
    let commands = large_event(3_000);
    let mut executor = executor(&commands);
    executor
        .execute(Command::Fold(FoldCommand::FoldAll))
        .unwrap();
    c.bench_function("hidden_indices/3k_fold_all", |b| {
        b.iter(|| black_box(executor.visible_indices().len()))
    });
}

fn bench_toggle_disabled_all(c: &mut Criterion) {
    let commands = large_event(3_000);
    c.bench_function("toggle_disabled/3k_select_all", |b| {
        b.iter_batched(
            || {
                let mut executor = executor(&commands);
                executor
                    .execute(Command::Selection(SelectionCommand::SelectAll))
                    .unwrap();
                executor
            },
            |mut executor| {
                executor
                    .execute(Command::Edit(EditCommand::ToggleDisabled))
                    .unwrap();
                black_box(executor.commands().len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_search(c: &mut Criterion) {
    let commands = large_event(3_000);
    c.bench_function("search/3k_literal", |b| {
        b.iter_batched(
            || executor(&commands),
            |mut executor| {
                let result = executor
                    .execute(Command::Search(SearchCommand::Find {
                        query: "quick brown".to_string(),
                        options: SearchOptions::default(),
                    }))
                    .unwrap();
                black_box(result);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_group_resolution,
    bench_selection_expansion,
    bench_hidden_indices,
    bench_toggle_disabled_all,
    bench_search
);
criterion_main!(benches);
