use collision_index::{filter, AsyncTree, IndexConfig, Label, OwnerId, Point2, Rect2, Space, Tree};
use std::thread;
use std::time::Instant;

const WALL: Label = Label(1);
const PLAYER: Label = Label(2);

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== 碰撞索引并发演示 ===\n");

    let config = IndexConfig::default()
        .validated()
        .unwrap_or_else(|e| panic!("{}", e));
    let tree = Tree::from_config(&config).unwrap();

    println!("1. 构建场景");
    build_walls(&tree);
    println!("   墙体数量: {}", tree.len());

    println!("\n2. 多个玩家并发移动");
    concurrent_players(&tree);

    println!("\n3. 查询");
    queries(&tree);

    println!("\n4. 异步版本");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async_players());

    println!("\n=== 演示完成 ===");
}

/// 四周的围墙加上中间一排柱子
fn build_walls(tree: &Tree) {
    let mut walls = vec![
        Space::from_xywh(0.0, 0.0, 100.0, 1.0, OwnerId(0), WALL),
        Space::from_xywh(0.0, 99.0, 100.0, 1.0, OwnerId(0), WALL),
        Space::from_xywh(0.0, 0.0, 1.0, 100.0, OwnerId(0), WALL),
        Space::from_xywh(99.0, 0.0, 1.0, 100.0, OwnerId(0), WALL),
    ];
    for i in 0..10 {
        walls.push(Space::from_xywh(5.0 + i as f64 * 10.0, 50.0, 2.0, 2.0, OwnerId(0), WALL));
    }
    tree.add(&walls).unwrap();
}

fn concurrent_players(tree: &Tree) {
    let start = Instant::now();

    let handles: Vec<_> = (1..=8u64)
        .map(|player_id| {
            let tree = tree.clone(); // 通过clone共享同一个索引
            thread::spawn(move || {
                let mut player = Space::from_xywh(
                    player_id as f64 * 10.0,
                    10.0,
                    3.0,
                    3.0,
                    OwnerId(player_id),
                    PLAYER,
                );
                tree.add([&player]).unwrap();

                // 向下移动，碰到墙就停下
                let mut steps = 0;
                while steps < 100 {
                    tree.shift_space(0.0, 1.0, Some(&mut player)).unwrap();
                    if tree.hit_label(&player, &[WALL]).is_some() {
                        tree.shift_space(0.0, -1.0, Some(&mut player)).unwrap();
                        break;
                    }
                    steps += 1;
                }

                let others = tree.hits_filtered(&player, filter::with_labels(&[PLAYER]));
                println!(
                    "   玩家{}: 移动{}步后停在 ({:.1}, {:.1})，接触其他玩家 {} 个",
                    player_id,
                    steps,
                    player.x(),
                    player.y(),
                    others.len()
                );
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!("   完成，耗时 {:?}", start.elapsed());
    match tree.check_invariants() {
        Ok(()) => println!("   结构检查通过"),
        Err(e) => println!("   结构检查失败: {}", e),
    }
}

fn queries(tree: &Tree) {
    let area = Rect2::xyxy(0.0, 40.0, 50.0, 60.0);
    let found = tree.search_intersect(&area);
    println!("   区域 {:?} 内有 {} 个对象", area, found.len());

    let center = Point2::xy(50.0, 50.0);
    if let Some(space) = tree.nearest_neighbor(&center) {
        println!("   距离中心最近的对象: {}", space);
    }
    for space in tree.nearest_neighbors(3, &center) {
        println!("   k近邻: {}", space);
    }
}

async fn async_players() {
    let tree = AsyncTree::new(4, 16).unwrap();

    let tasks: Vec<_> = (0..4u64)
        .map(|task_id| {
            let tree = tree.clone();
            tokio::spawn(async move {
                let mut space = Space::from_xywh(task_id as f64 * 2.0, 0.0, 3.0, 3.0, OwnerId(task_id), PLAYER);
                tree.add([&space]).await.unwrap();
                tree.update_space(task_id as f64 * 2.0, 5.0, 3.0, 3.0, Some(&mut space))
                    .await
                    .unwrap();
                tree.hits(&space).await.len()
            })
        })
        .collect();

    for (task_id, task) in tasks.into_iter().enumerate() {
        println!("   任务{}: 碰撞 {} 个对象", task_id, task.await.unwrap());
    }
    println!("   对象总数: {}", tree.len().await);
}
