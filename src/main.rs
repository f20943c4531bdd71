mod logging;
mod models;
mod scenario;
mod simulation;

use clap::{Arg, Command};
use logging::{LogConfig, LogOutput, ensure_log_directory, init_logging, parse_log_level};
use models::{Position3D as ModelPosition3D, *};
use scenario::*;
use simulation::SimulationEngine;
use std::str::FromStr;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("guardsim")
        .version("0.1.0")
        .about("警備シミュレーション (Guard Patrol Simulation)")
        .long_about("エージェントベースの警備シミュレーションシステム\n\
                     ガードの知覚・警戒遷移と監視カメラの警報連携を時間駆動型で評価します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、利用可能なシナリオ一覧を表示します。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("エージェントモデルのテストを実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("DEST")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .get_matches();

    println!("警備シミュレーション (Guard Patrol Simulation) - guardsim v0.1.0");
    println!();

    // ログシステムの初期化
    let log_output = matches
        .get_one::<String>("log-output")
        .map(|s| LogOutput::from_str(s))
        .unwrap_or(Ok(LogOutput::Console))
        .unwrap_or_else(|e| {
            eprintln!("警告: {}. consoleを使用します", e);
            LogOutput::Console
        });
    let log_level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or(tracing::Level::INFO);

    let log_config = LogConfig {
        level: log_level,
        output: log_output,
        ..LogConfig::default()
    };
    if log_output != LogOutput::Console {
        if let Err(e) = ensure_log_directory(&log_config.log_dir) {
            eprintln!("エラー: ログディレクトリを作成できません: {}", e);
            std::process::exit(1);
        }
    }
    if let Err(e) = init_logging(log_config) {
        eprintln!("エラー: ログ初期化に失敗しました: {}", e);
        std::process::exit(1);
    }

    // 詳細レベルの設定
    let verbose_level = matches.get_count("verbose");
    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    // テストモードの実行
    if matches.get_flag("test") {
        println!("=== エージェントモデルテストモード ===");
        test_agent_models();
        return;
    }

    // シナリオファイルの処理
    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // デフォルト動作: 利用可能なシナリオ一覧を表示
        show_default_help();
    }
}

fn test_agent_models() {
    println!("\n=== エージェントモデルのテスト ===");

    // ガードの作成
    let guard_pos = ModelPosition3D::new(10.0, 0.0, 0.0);
    let waypoints = vec![
        ModelPosition3D::new(10.0, 0.0, 0.0),
        ModelPosition3D::new(10.0, 20.0, 0.0),
        ModelPosition3D::new(-10.0, 20.0, 0.0),
    ];
    let guard = Guard::new("G001".to_string(), guard_pos, 90.0, waypoints);
    println!("ガードが作成されました: {} (状態: {:?})", guard.get_id(), guard.state);

    // 監視カメラの作成
    let camera_pos = ModelPosition3D::new(0.0, 25.0, 0.0);
    let camera = ScanCamera::new("CAM001".to_string(), camera_pos, -90.0);
    println!("監視カメラが作成されました: {}", camera.get_id());

    // 侵入者の作成
    let route = vec![
        ModelPosition3D::new(-20.0, 0.0, 0.0),
        ModelPosition3D::new(0.0, 10.0, 0.0),
    ];
    let intruder = Intruder::new("TGT001".to_string(), route[0], route);
    println!("侵入者が作成されました: {}", intruder.get_id());

    // ワールドと警報バスの作成
    let world = World::new(vec![Obstacle {
        id: "OBS001".to_string(),
        center: ModelPosition3D::new(0.0, 12.0, 0.0),
        radius: 1.5,
    }]);
    println!("ワールドが作成されました: 遮蔽物 {}個", world.obstacles.len());

    let alert_bus = AlertBus::new();
    println!("警報バスが作成されました: 保留イベント {}件", alert_bus.pending());

    println!("\n全てのエージェントモデルが正常に作成されました！");
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, info_only: bool, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    // シナリオファイルの読み込み
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    // 情報表示のみの場合
    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    // シナリオ実行
    execute_scenario(scenario, verbose_level)?;

    Ok(())
}

/// シナリオの実行
fn execute_scenario(scenario: ScenarioConfig, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    // 基本情報表示
    scenario.print_summary();
    println!();

    if verbose_level > 0 {
        println!("シミュレーション設定:");
        println!("  時間刻み: {:.3}秒", scenario.sim.dt_s);
        println!("  最大時間: {:.1}秒", scenario.sim.t_max_s);
        println!("  シード値: {}", scenario.sim.seed);
        println!();
    }

    // シミュレーションエンジンの作成と初期化
    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;

    // シミュレーション実行
    simulation.run()?;

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  guardsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>  シナリオファイルを指定して実行");
    println!("  -i, --info             シナリオ情報のみ表示");
    println!("  -t, --test             エージェントモデルのテスト実行");
    println!("  -v, --verbose          詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-output <DEST> ログ出力先 (console, file, both)");
    println!("      --log-level <LEVEL> ログレベル (trace, debug, info, warn, error)");
    println!("  -h, --help             このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/scenario_simple_patrol.yaml  - 巡回と追跡の基本シナリオ");
    println!("  scenarios/scenario_camera_sweep.yaml   - カメラ警報連携シナリオ");
    println!("  scenarios/scenario_occlusion_test.yaml - 遮蔽物による視線遮断の検証用");
    println!();
    println!("例:");
    println!("  guardsim -s scenarios/scenario_simple_patrol.yaml");
    println!("  guardsim -s scenarios/scenario_camera_sweep.yaml -v");
    println!("  guardsim -s scenarios/scenario_simple_patrol.yaml -i");
    println!("  guardsim --test");
}
