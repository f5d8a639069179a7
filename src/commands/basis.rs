//! # basis 命令实现
//!
//! 报告空间群、团簇轨道与每阶基函数个数。默认不读取训练数据；
//! 指定 `--with-data` 时组装设计矩阵并报告保留下来的列数。
//!
//! ## 依赖关系
//! - 使用 `cli/basis.rs` 定义的 BasisArgs
//! - 使用 `commands/pipeline.rs` 的共享步骤

use super::pipeline;
use crate::cli::basis::BasisArgs;
use crate::error::Result;
use crate::fcs::{ForceConstantModel, Interaction};
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Order")]
    name: String,
    #[tabled(rename = "Cutoff (bohr)")]
    cutoff: String,
    #[tabled(rename = "Max atoms")]
    nbody: usize,
    #[tabled(rename = "Orbits")]
    orbits: usize,
    #[tabled(rename = "Clusters")]
    clusters: usize,
    #[tabled(rename = "Candidates")]
    candidates: usize,
    #[tabled(rename = "Parameters")]
    parameters: String,
}

/// 执行 basis 命令
pub fn execute(args: BasisArgs) -> Result<()> {
    output::print_header("Force Constant Basis");

    let crystal = pipeline::load_crystal(&args.data)?;
    let mut model = pipeline::build_model(&crystal, &args.model)?;
    output::print_info(&format!(
        "Primitive atoms: {}",
        model
            .group
            .primitive_atoms()
            .iter()
            .map(|i| (i + 1).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    ));

    let parameters = if args.with_data {
        let pool = pipeline::build_pool(args.jobs)?;
        let data = pipeline::load_data(&args.data, crystal.n_atoms())?;
        pipeline::assemble(&mut model, &data, &pool)?;
        Some(model.parameters_per_order())
    } else {
        None
    };

    let rows = order_rows(&model, parameters.as_deref());
    output::print_header("Basis Functions per Order");
    println!("{}", Table::new(&rows));

    match parameters {
        Some(_) => output::print_done(&format!(
            "{} of {} candidate basis functions survive",
            model.n_parameters(),
            model.candidates.len()
        )),
        None => output::print_done(&format!(
            "{} candidate basis functions (use --with-data to count surviving columns)",
            model.candidates.len()
        )),
    }
    Ok(())
}

fn order_rows(model: &ForceConstantModel, parameters: Option<&[usize]>) -> Vec<OrderRow> {
    let inter = &model.interaction;
    (1..=inter.maxorder)
        .map(|order| OrderRow {
            name: Interaction::order_name(order),
            cutoff: inter
                .cutoff(order)
                .map_or_else(|| "none".to_string(), |c| format!("{:.3}", c)),
            nbody: inter.max_cluster_size(order),
            orbits: model.orbits.iter().filter(|o| o.order == order).count(),
            clusters: model
                .orbits
                .iter()
                .filter(|o| o.order == order)
                .map(|o| o.multiplicity)
                .sum(),
            candidates: model.candidates.iter().filter(|f| f.order == order).count(),
            parameters: parameters
                .map_or_else(|| "-".to_string(), |p| p[order - 1].to_string()),
        })
        .collect()
}
