use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nuggets::core::grid::GridPoint;
use nuggets::game::map::GameMap;
use nuggets::game::visibility::PlayerView;

/// A large open room with a row of pillars.
fn hall(cols: usize, rows: usize) -> String {
    let mut text = format!("+{}+\n", "-".repeat(cols));
    for r in 0..rows {
        let row: String = (0..cols)
            .map(|c| if r == rows / 2 && c % 4 == 0 { '|' } else { '.' })
            .collect();
        text.push_str(&format!("|{row}|\n"));
    }
    text.push_str(&format!("+{}+\n", "-".repeat(cols)));
    text
}

fn bench_refresh(c: &mut Criterion) {
    let map = GameMap::parse(&hall(78, 19)).unwrap();
    let mut view = PlayerView::new(&map);

    c.bench_function("refresh_view_80x21", |b| {
        b.iter(|| view.refresh(&map, black_box(GridPoint::new(40, 5))))
    });
}

criterion_group!(benches, bench_refresh);
criterion_main!(benches);
