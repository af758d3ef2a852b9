//! Integration tests: services seed the shop, every read strategy reads it back.

use common::{ItemId, MemberId, OrderId};
use domain::{Address, Money, NewItem, NewMember, OrderStatus};
use projections::reads::{entity_graph, read_orders};
use projections::simple::read_simple_orders;
use projections::{
    OrderDto, OrderQueryService, OrderReadStrategy, ProjectionError, SimpleOrderStrategy,
};
use service::{ItemService, MemberService, OrderService};
use store::{InMemoryStore, OrderSearch, Page, Store, Transaction};

struct Seeded {
    store: InMemoryStore,
    orders: Vec<OrderId>,
}

async fn book(items: &ItemService<InMemoryStore>, name: &str, price: i64) -> ItemId {
    items
        .save_item(NewItem::book(name, Money::new(price), 100, "author", "isbn"))
        .await
        .unwrap()
        .id
}

async fn member(members: &MemberService<InMemoryStore>, name: &str, city: &str) -> MemberId {
    members
        .join(NewMember::new(name, Address::new(city, "1", "1111")))
        .await
        .unwrap()
}

/// Two members and four books; userA orders twice and reuses JPA1 so the
/// reads see shared entities.
async fn seed() -> Seeded {
    let store = InMemoryStore::new();
    let members = MemberService::new(store.clone());
    let items = ItemService::new(store.clone());
    let orders = OrderService::new(store.clone());

    let user_a = member(&members, "userA", "Seoul").await;
    let user_b = member(&members, "userB", "Busan").await;
    let jpa1 = book(&items, "JPA1 BOOK", 10_000).await;
    let jpa2 = book(&items, "JPA2 BOOK", 20_000).await;
    let spring1 = book(&items, "SPRING1 BOOK", 20_000).await;
    let spring2 = book(&items, "SPRING2 BOOK", 40_000).await;

    let first = orders
        .order(user_a, &[(jpa1, 1), (jpa2, 2)])
        .await
        .unwrap();
    let second = orders
        .order(user_b, &[(spring1, 3), (spring2, 4)])
        .await
        .unwrap();
    let third = orders.order(user_a, &[(jpa1, 5)]).await.unwrap();

    Seeded {
        store,
        orders: vec![first, second, third],
    }
}

/// Flattens orders into comparable tuples.
fn content(orders: &[OrderDto]) -> Vec<(OrderId, String, OrderStatus, String, Vec<(String, i64, u32)>)> {
    orders
        .iter()
        .map(|order| {
            (
                order.order_id,
                order.name.clone(),
                order.order_status,
                order.address.city().to_string(),
                order
                    .order_items
                    .iter()
                    .map(|line| (line.item_name.clone(), line.order_price.amount(), line.count))
                    .collect(),
            )
        })
        .collect()
}

async fn read_counted(
    store: &InMemoryStore,
    strategy: OrderReadStrategy,
    search: &OrderSearch,
    page: Option<Page>,
) -> (Vec<OrderDto>, u64) {
    let mut tx = store.begin().await.unwrap();
    let orders = read_orders(&mut tx, strategy, search, page).await.unwrap();
    (orders, tx.query_count())
}

#[tokio::test]
async fn every_strategy_returns_the_same_orders() {
    let seeded = seed().await;
    let search = OrderSearch::new();

    let (baseline, _) =
        read_counted(&seeded.store, OrderReadStrategy::EntityGraph, &search, None).await;
    assert_eq!(baseline.len(), 3);
    assert_eq!(
        baseline.iter().map(|o| o.order_id).collect::<Vec<_>>(),
        seeded.orders
    );
    assert_eq!(baseline[0].name, "userA");
    assert_eq!(baseline[1].address.city(), "Busan");
    assert_eq!(baseline[1].order_items[1].item_name, "SPRING2 BOOK");
    assert_eq!(baseline[1].order_items[1].count, 4);

    for strategy in OrderReadStrategy::ALL {
        let (orders, _) = read_counted(&seeded.store, strategy, &search, None).await;
        assert_eq!(content(&orders), content(&baseline), "strategy {strategy}");
        assert_eq!(orders, baseline, "strategy {strategy}");
    }
}

#[tokio::test]
async fn strategies_differ_in_query_count() {
    let seeded = seed().await;
    let search = OrderSearch::new();

    let expected = [
        // roots + 2 members + 3 deliveries + 3 line lists + 4 items
        (OrderReadStrategy::EntityGraph, 13),
        (OrderReadStrategy::EntityDto, 13),
        (OrderReadStrategy::ToOneFetchJoin, 3),
        (OrderReadStrategy::FullFetchJoin, 1),
        (OrderReadStrategy::DtoPerOrder, 4),
        (OrderReadStrategy::DtoBatched, 2),
        (OrderReadStrategy::FlatGrouped, 1),
    ];
    for (strategy, queries) in expected {
        let (_, issued) = read_counted(&seeded.store, strategy, &search, None).await;
        assert_eq!(issued, queries, "strategy {strategy}");
    }
}

#[tokio::test]
async fn shared_entities_are_loaded_once_per_read() {
    let seeded = seed().await;
    let mut tx = seeded.store.begin().await.unwrap();

    let views = entity_graph(&mut tx, &OrderSearch::new(), None)
        .await
        .unwrap();

    assert_eq!(views[0].member, views[2].member);
    assert_eq!(views[0].order_items[0].item, views[2].order_items[0].item);
    assert_eq!(tx.query_count(), 13);
}

#[tokio::test]
async fn collection_joins_refuse_pages() {
    let seeded = seed().await;

    for strategy in [
        OrderReadStrategy::FullFetchJoin,
        OrderReadStrategy::FlatGrouped,
    ] {
        let mut tx = seeded.store.begin().await.unwrap();
        let result = read_orders(
            &mut tx,
            strategy,
            &OrderSearch::new(),
            Some(Page::new(0, 1)),
        )
        .await;

        assert!(
            matches!(result, Err(ProjectionError::PaginationUnsupported { strategy: name }) if name == strategy.name())
        );
        assert_eq!(tx.query_count(), 0);
    }
}

#[tokio::test]
async fn pages_count_orders_not_lines() {
    let seeded = seed().await;
    let page = Some(Page::new(1, 1));

    for strategy in OrderReadStrategy::ALL
        .into_iter()
        .filter(|s| s.is_pagination_safe())
    {
        let (orders, _) = read_counted(&seeded.store, strategy, &OrderSearch::new(), page).await;

        assert_eq!(orders.len(), 1, "strategy {strategy}");
        assert_eq!(orders[0].order_id, seeded.orders[1], "strategy {strategy}");
        assert_eq!(orders[0].order_items.len(), 2, "strategy {strategy}");
    }
}

#[tokio::test]
async fn filters_apply_to_every_strategy() {
    let seeded = seed().await;
    OrderService::new(seeded.store.clone())
        .cancel_order(seeded.orders[1])
        .await
        .unwrap();

    let cancelled = OrderSearch::new().status(OrderStatus::Cancelled);
    let by_name = OrderSearch::new().member_name("userA");

    for strategy in OrderReadStrategy::ALL {
        let (orders, _) = read_counted(&seeded.store, strategy, &cancelled, None).await;
        assert_eq!(
            orders.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![seeded.orders[1]],
            "strategy {strategy}"
        );
        assert_eq!(orders[0].order_status, OrderStatus::Cancelled);

        let (orders, _) = read_counted(&seeded.store, strategy, &by_name, None).await;
        assert_eq!(
            orders.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![seeded.orders[0], seeded.orders[2]],
            "strategy {strategy}"
        );
    }
}

#[tokio::test]
async fn empty_store_reads_nothing() {
    let store = InMemoryStore::new();

    for strategy in OrderReadStrategy::ALL {
        let (orders, issued) = read_counted(&store, strategy, &OrderSearch::new(), None).await;
        assert!(orders.is_empty());
        assert_eq!(issued, 1, "strategy {strategy}");
    }
}

#[tokio::test]
async fn simple_strategies_agree() {
    let seeded = seed().await;
    let search = OrderSearch::new();

    let expected = [
        // roots + 2 members + 3 deliveries
        (SimpleOrderStrategy::EntityGraph, 6),
        (SimpleOrderStrategy::EntityDto, 6),
        (SimpleOrderStrategy::FetchJoin, 1),
        (SimpleOrderStrategy::DirectDto, 1),
    ];

    let mut results = Vec::new();
    for (strategy, queries) in expected {
        let mut tx = seeded.store.begin().await.unwrap();
        let orders = read_simple_orders(&mut tx, strategy, &search).await.unwrap();
        assert_eq!(tx.query_count(), queries, "strategy {strategy}");
        results.push(orders);
    }

    assert_eq!(results[0].len(), 3);
    assert_eq!(results[0][1].name, "userB");
    for orders in &results[1..] {
        assert_eq!(orders, &results[0]);
    }
}

#[tokio::test]
async fn query_service_runs_each_read_in_its_own_transaction() {
    let seeded = seed().await;
    let service = OrderQueryService::new(seeded.store.clone());

    let dtos = service
        .read(OrderReadStrategy::DtoBatched, &OrderSearch::new(), None)
        .await
        .unwrap();
    let views = service.entities(&OrderSearch::new(), None).await.unwrap();
    let simple = service
        .read_simple(SimpleOrderStrategy::DirectDto, &OrderSearch::new())
        .await
        .unwrap();
    let simple_views = service.simple_entities(&OrderSearch::new()).await.unwrap();

    assert_eq!(dtos.len(), 3);
    assert_eq!(views.len(), 3);
    assert_eq!(simple.len(), 3);
    assert_eq!(simple_views[2].member.name, "userA");

    let paged = service
        .read(
            OrderReadStrategy::FlatGrouped,
            &OrderSearch::new(),
            Some(Page::default()),
        )
        .await;
    assert!(matches!(
        paged,
        Err(ProjectionError::PaginationUnsupported { .. })
    ));
}

#[tokio::test]
async fn entity_view_serializes_the_raw_graph() {
    let seeded = seed().await;
    let service = OrderQueryService::new(seeded.store.clone());

    let views = service.entities(&OrderSearch::new(), None).await.unwrap();
    let json = serde_json::to_value(&views[0]).unwrap();

    assert_eq!(json["member"]["name"], "userA");
    assert_eq!(json["delivery"]["status"], "READY");
    assert_eq!(json["status"], "ORDERED");
    assert_eq!(json["order_items"][0]["item"]["dtype"], "B");
    assert_eq!(json["order_items"][0]["item"]["name"], "JPA1 BOOK");
    assert!(json["order_items"][0].get("order_id").is_none());
}
