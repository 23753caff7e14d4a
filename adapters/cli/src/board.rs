use maze_chase_core::{CellCoord, CellKind, Frame};
use maze_chase_world::grid::GridMap;

/// Renders the grid overlay and every entity of a frame as text.
pub(crate) fn render(grid: &GridMap, frame: &Frame) -> String {
    let columns = grid.columns() as usize;
    let rows = grid.rows() as usize;
    let mut canvas: Vec<Vec<char>> = (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| glyph(grid.cell_at(CellCoord::new(column as i32, row as i32))))
                .collect()
        })
        .collect();

    for adversary in frame.adversaries.iter() {
        let mark = if adversary.scared { 'w' } else { 'G' };
        plot(&mut canvas, adversary.cell, mark);
    }
    plot(&mut canvas, frame.player.cell, '@');

    let mut text = String::with_capacity(rows * (columns + 1));
    for line in canvas {
        text.extend(line);
        text.push('\n');
    }
    text
}

fn glyph(kind: CellKind) -> char {
    match kind {
        CellKind::Wall => '#',
        CellKind::BreakableWall => '%',
        CellKind::Collectible => '.',
        CellKind::PowerCollectible => 'o',
        CellKind::AdversaryHome => '-',
        CellKind::Open | CellKind::PlayerSpawn | CellKind::AdversarySpawn => ' ',
    }
}

fn plot(canvas: &mut [Vec<char>], cell: CellCoord, mark: char) {
    let (Ok(column), Ok(row)) = (usize::try_from(cell.column()), usize::try_from(cell.row()))
    else {
        return;
    };
    if let Some(slot) = canvas.get_mut(row).and_then(|line| line.get_mut(column)) {
        *slot = mark;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::Tuning;
    use maze_chase_world::{grid::Layout, query, World};

    #[test]
    fn renders_cells_and_entities() {
        let layout = Layout::parse("#######\n#P.o%G#\n#######").expect("valid layout");
        let world = World::with_layout(layout, Tuning::default());

        let text = render(query::grid(&world), &query::frame(&world));

        assert_eq!(text, "#######\n#@.o%G#\n#######\n");
    }

    #[test]
    fn entities_in_tunnel_mouths_are_skipped() {
        let layout = Layout::parse("#####\n..P..\n#####").expect("valid layout");
        let world = World::with_layout(layout, Tuning::default());
        let mut frame = query::frame(&world);
        frame.player.cell = CellCoord::new(-1, 1);

        let text = render(query::grid(&world), &frame);

        assert_eq!(text, "#####\n.. ..\n#####\n");
    }
}
