use mapcore_datatypes::{ChunkedMap, Position};

/// What field of an item a search query is matched against. `ByName` has no server-side
/// fallback without a client item-description table (which this workspace doesn't carry), so
/// it only ever matches creature names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSearchMode {
    ByServerId,
    ByName,
}

/// One hit from [`MapSearchService::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSearchResult {
    pub position:        Position,
    pub item_id:         u16,
    pub creature_name:   Option<String>,
    pub is_in_container: bool,
}

/// Searches a map's tiles for items by server id or creatures by (fuzzy, case-insensitive)
/// name. Recurses into container contents the same way the original walks nested containers.
#[derive(Debug, Default)]
pub struct MapSearchService;

impl MapSearchService {
    pub fn search(
        map: &ChunkedMap,
        query: &str,
        mode: MapSearchMode,
        search_items: bool,
        search_creatures: bool,
        limit: usize,
    ) -> Vec<MapSearchResult> {
        let mut results = Vec::new();
        if query.is_empty() || limit == 0 {
            return results;
        }

        let query_lower = query.to_lowercase();
        let search_id: u16 = if mode == MapSearchMode::ByServerId {
            match query.parse() {
                Ok(id) => id,
                Err(_) => return results,
            }
        } else {
            0
        };

        map.for_each_tile(|tile| {
            if results.len() >= limit {
                return;
            }

            if search_items {
                if let Some(ground) = &tile.ground {
                    if mode == MapSearchMode::ByServerId && ground.server_id == search_id {
                        results.push(MapSearchResult {
                            position: tile.position,
                            item_id: ground.server_id,
                            creature_name: None,
                            is_in_container: false,
                        });
                    }
                }

                for item in &tile.items {
                    if results.len() >= limit {
                        return;
                    }
                    if mode == MapSearchMode::ByServerId && item.server_id == search_id {
                        results.push(MapSearchResult {
                            position: tile.position,
                            item_id: item.server_id,
                            creature_name: None,
                            is_in_container: false,
                        });
                    }
                    Self::search_container(item, tile.position, mode, search_id, &mut results, limit);
                }
            }

            if search_creatures && mode == MapSearchMode::ByName {
                if let Some(creature) = &tile.creature {
                    if creature.name.to_lowercase().contains(&query_lower) {
                        results.push(MapSearchResult {
                            position: tile.position,
                            item_id: 0,
                            creature_name: Some(creature.name.clone()),
                            is_in_container: false,
                        });
                    }
                }
            }
        });

        results
    }

    fn search_container(
        container: &mapcore_datatypes::Item,
        position: Position,
        mode: MapSearchMode,
        search_id: u16,
        results: &mut Vec<MapSearchResult>,
        limit: usize,
    ) {
        for item in &container.contents {
            if results.len() >= limit {
                return;
            }
            if mode == MapSearchMode::ByServerId && item.server_id == search_id {
                results.push(MapSearchResult {
                    position,
                    item_id: item.server_id,
                    creature_name: None,
                    is_in_container: true,
                });
            }
            Self::search_container(item, position, mode, search_id, results, limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::{Creature, Item, Tile};

    use super::*;

    #[test]
    fn search_by_server_id_finds_ground_and_stacked_items() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        map.set_tile(pos, tile);

        let results = MapSearchService::search(&map, "200", MapSearchMode::ByServerId, true, false, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, 200);
    }

    #[test]
    fn search_finds_items_nested_in_containers() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut tile = Tile::new(pos);
        let mut bag = Item::new(1987);
        bag.contents.push(Item::new(9999));
        tile.add_item_direct(bag);
        map.set_tile(pos, tile);

        let results = MapSearchService::search(&map, "9999", MapSearchMode::ByServerId, true, false, 10);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_in_container);
    }

    #[test]
    fn search_by_name_fuzzy_matches_creatures() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut tile = Tile::new(pos);
        tile.creature = Some(Creature::new("Dragon Lord"));
        map.set_tile(pos, tile);

        let results = MapSearchService::search(&map, "dragon", MapSearchMode::ByName, false, true, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].creature_name.as_deref(), Some("Dragon Lord"));
    }

    #[test]
    fn search_respects_the_result_limit() {
        let mut map = ChunkedMap::new();
        for x in 0..5 {
            let pos = Position::new(x, 0, 7);
            let mut tile = Tile::new(pos);
            tile.set_ground(Item::new(500));
            map.set_tile(pos, tile);
        }

        let results = MapSearchService::search(&map, "500", MapSearchMode::ByServerId, true, false, 2);
        assert_eq!(results.len(), 2);
    }
}
