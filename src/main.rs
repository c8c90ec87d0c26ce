//! NLMap - 自然语言任务理解 → 物体落地 → 分阶段规划
//!
//! 入口：初始化日志、加载配置、构建物品清单与后端，然后进入交互循环或批处理演示。
//!
//! ```bash
//! cargo run -- --scene office            # 交互模式
//! cargo run -- --demo --scene kitchen    # 跑预置场景的示例任务
//! cargo run -- "help me make a cup of coffee"
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use nlmap_agent::config::load_config;
use nlmap_agent::core::{
    build_inventory_from_config, BatchReport, Orchestrator, PipelineBuilder, PipelineError,
    RunHistory, SessionSupervisor, TaskOutcome,
};
use nlmap_agent::grounding::{find_scene, InventorySnapshot, MatchKind, SCENE_PRESETS};
use nlmap_agent::observability;

#[derive(Parser, Debug)]
#[command(name = "nlmap", version, about = "自然语言任务 → 物体落地 → 分阶段规划")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 预置场景：kitchen / living_room / office / bedroom
    #[arg(short, long)]
    scene: Option<String>,

    /// 后端：auto / mock / qwen / openai / deepseek
    #[arg(short, long)]
    provider: Option<String>,

    /// 模拟感知的随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 从 JSON 导入物品清单，不再模拟提取
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// 启动时把物品清单导出为 JSON
    #[arg(long)]
    export: Option<PathBuf>,

    /// 依次执行场景的示例任务后退出
    #[arg(long)]
    demo: bool,

    /// 直接执行的任务；为空时进入交互模式
    tasks: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.clone()).context("Failed to load config")?;
    if let Some(scene) = &cli.scene {
        cfg.inventory.scene = scene.clone();
    }
    if let Some(provider) = &cli.provider {
        cfg.llm.provider = provider.clone();
    }
    if cli.seed.is_some() {
        cfg.inventory.seed = cli.seed;
    }

    let inventory = match &cli.inventory {
        Some(path) => InventorySnapshot::load(path)
            .with_context(|| format!("Failed to import inventory from {}", path.display()))?,
        None => build_inventory_from_config(&cfg).context("Failed to build inventory")?,
    };

    if let Some(path) = cli.export.as_ref().or(cfg.inventory.export_path.as_ref()) {
        inventory
            .save(path)
            .with_context(|| format!("Failed to export inventory to {}", path.display()))?;
        println!("💾 物品清单已导出到 {}", path.display());
    }

    let scene_key = cfg.inventory.scene.clone();
    let orchestrator = PipelineBuilder::new(cfg)
        .with_inventory(inventory)
        .build()
        .context("Failed to build pipeline")?;

    println!(
        "🚀 NLMap 已就绪：后端 {}，物品 {} 个",
        orchestrator.backend_name(),
        orchestrator.inventory().len()
    );

    if cli.demo {
        let scene = find_scene(&scene_key)
            .with_context(|| format!("Unknown scene '{scene_key}'"))?;
        println!("\n🏠 {}：{}", scene.title, scene.description);
        let report = orchestrator.run_batch(scene.sample_tasks).await;
        print_report(&report);
        return finish_batch(report);
    }

    if !cli.tasks.is_empty() {
        let report = orchestrator.run_batch(&cli.tasks[..]).await;
        print_report(&report);
        return finish_batch(report);
    }

    interactive(&orchestrator).await
}

fn finish_batch(report: BatchReport) -> anyhow::Result<()> {
    match report.aborted {
        Some(e) => Err(e).context("Batch aborted"),
        None => Ok(()),
    }
}

async fn interactive(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let supervisor = Arc::new(SessionSupervisor::new());
    let session = supervisor.session_token();

    // Ctrl+C：有任务在途时只取消该任务，空闲时退出
    {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !supervisor.cancel_current() {
                    supervisor.shutdown();
                    break;
                }
            }
        });
    }

    print_help();
    let mut history = RunHistory::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n🎯 请输入任务: ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            _ = session.cancelled() => {
                println!("\n👋 再见！");
                // 在途的 stdin 阻塞读取无法中断，直接结束进程
                std::process::exit(0);
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else { break };
        let input = line.trim();

        match input.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" => print_help(),
            "list" => print_inventory(orchestrator.inventory()),
            "scenes" => print_scenes(),
            "history" => print_history(&history),
            "stats" => print_stats(&history, orchestrator),
            "clear" => {
                history.clear();
                println!("🧹 运行记录已清空");
            }
            _ => {
                let token = supervisor.begin_task();
                let result = orchestrator.run_task_with_cancel(input, &token).await;
                supervisor.finish_task();
                match result {
                    Ok(outcome) => {
                        print_outcome(&outcome);
                        history.push(outcome);
                    }
                    Err(PipelineError::Cancelled) => println!("⏹ 任务已取消"),
                    Err(e) if e.is_fatal() => return Err(e).context("Pipeline failed"),
                    Err(e) => println!("   ✗ 处理失败: {e}"),
                }
            }
        }
    }

    println!("👋 再见！");
    Ok(())
}

fn print_help() {
    println!("\n命令：list 查看物品清单 | scenes 预置场景 | history 运行记录");
    println!("      stats 统计 | clear 清空记录 | quit 退出");
    println!("其余输入作为任务处理（中英文均可），处理中按 Ctrl+C 取消当前任务");
}

fn print_inventory(inventory: &InventorySnapshot) {
    println!("\n📦 可用物品清单 ({} 个):", inventory.len());
    for (i, obj) in inventory.iter().enumerate() {
        println!(
            "  {:2}. {} (位置: {:.1}, {:.1}, {:.1}，置信度 {:.2})",
            i + 1,
            obj.id,
            obj.position[0],
            obj.position[1],
            obj.position[2],
            obj.confidence
        );
    }
}

fn print_scenes() {
    for scene in SCENE_PRESETS {
        println!("\n🏠 {} ({})：{}", scene.title, scene.key, scene.description);
        println!("   示例任务：{}", scene.sample_tasks.join("、"));
    }
}

fn print_outcome(outcome: &TaskOutcome) {
    println!("\n🔍 处理任务: {}", outcome.task);
    println!("{}", "-".repeat(40));

    println!("\n1. 物品提议:");
    if outcome.proposals.is_empty() {
        println!("   （模型没有给出可用的物品）");
    } else {
        println!("   {}", outcome.proposals.join(", "));
    }
    println!("   ⏱️  耗时 {:.2} 秒", outcome.proposal_elapsed.as_secs_f64());

    println!("\n2. 在物品清单中查找匹配:");
    for m in &outcome.matches {
        match (&m.matched_object, m.kind) {
            (Some(name), MatchKind::Exact) => println!("   ✓ {}", name),
            (Some(name), _) => println!("   ≈ {} → {}", m.proposal, name),
            (None, _) => println!("   ✗ {}", m.proposal),
        }
    }
    if outcome.used_fallback {
        println!("   ⚠ 未找到匹配的物品，改用: {}", outcome.plan_objects.join(", "));
    }

    println!("\n3. 分阶段规划:");
    for line in outcome.plan_text.lines() {
        println!("   {}", line);
    }
    if let Some(plan) = &outcome.plan {
        println!(
            "   （获取 {} 步，执行 {} 步）",
            plan.acquisition.len(),
            plan.execution.len()
        );
    }
    println!("   ⏱️  耗时 {:.2} 秒", outcome.planning_elapsed.as_secs_f64());

    if !outcome.actions.is_empty() {
        println!("\n4. 可执行的操作:");
        for action in &outcome.actions {
            println!("   • {}", action);
        }
    }
}

fn print_report(report: &BatchReport) {
    for outcome in &report.outcomes {
        print_outcome(outcome);
    }
    for (task, reason) in &report.skipped {
        println!("\n⚠ 跳过任务「{}」：{}", task, reason);
    }
    let total: f64 = report
        .outcomes
        .iter()
        .map(|o| o.total_elapsed().as_secs_f64())
        .sum();
    println!(
        "\n📊 完成 {} 个任务，跳过 {} 个，总耗时 {:.2} 秒",
        report.outcomes.len(),
        report.skipped.len(),
        total
    );
}

fn print_history(history: &RunHistory) {
    if history.is_empty() {
        println!("（暂无运行记录）");
        return;
    }
    for (i, record) in history.records().iter().enumerate() {
        println!(
            "  {:2}. [{}] {} → {} 个物品{}",
            i + 1,
            record.started_at.format("%H:%M:%S"),
            record.task,
            record.plan_objects.len(),
            if record.used_fallback { "（兜底）" } else { "" }
        );
    }
}

fn print_stats(history: &RunHistory, orchestrator: &Orchestrator) {
    let stats = history.stats();
    println!(
        "📊 任务 {} 个，落地物品 {} 个，兜底 {} 次；平均提议 {:.2} 秒，平均规划 {:.2} 秒",
        stats.tasks,
        stats.grounded_objects,
        stats.fallbacks,
        stats.avg_proposal.as_secs_f64(),
        stats.avg_planning.as_secs_f64()
    );
    let (prompt, completion, total) = orchestrator.token_usage();
    if total > 0 {
        println!("   Token 使用: 输入 {prompt}，输出 {completion}，合计 {total}");
    }
}
