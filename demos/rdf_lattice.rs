use cellcorr::structure_factor::k_values;
use cellcorr::{CellGrid, NeighborList, PartialCounts, Rdf, UnitCell, debye_from_histogram};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cell = UnitCell::fcc()?;
    let mut rdf = Rdf::new(60, 3.0, 0.0)?;
    let frames = 5;
    let mut n_points = 0;

    for frame in 0..frames {
        let (simbox, points) = cell.to_system([6, 6, 6], 1.4, 0.05, frame)?;
        let grid = CellGrid::new(simbox, &points, 1.5)?;
        let args = rdf.default_query_args().with_exclude_ii(true);

        // a neighbor list can be reused for several observables of the same frame
        let nlist = NeighborList::from_query(&grid, &points, &args)?;
        rdf.accumulate(&grid, &points, Some(&nlist), &args)?;
        n_points = points.len();
    }

    println!("{:>8} {:>10} {:>10}", "r", "g(r)", "N(r)");
    let centers = rdf.bin_centers();
    let g = rdf.rdf().to_vec();
    let n_r = rdf.n_r().to_vec();
    for ((r, g), n) in centers.iter().zip(&g).zip(&n_r) {
        println!("{:8.3} {:10.4} {:10.3}", r, g, n);
    }

    let k = k_values(40, 0.5, 12.0)?;
    let counts = rdf.bin_counts().to_vec();
    let s = debye_from_histogram(&k, &centers, &counts, &PartialCounts::single(n_points, frames as usize))?;

    println!();
    println!("{:>8} {:>10}", "k", "S(k)");
    for (k, s) in k.iter().zip(&s) {
        println!("{:8.3} {:10.4}", k, s);
    }
    Ok(())
}
