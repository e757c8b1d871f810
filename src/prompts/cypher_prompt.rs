//! Cypher generation prompt

/// Example statements shown to the model
const EXAMPLES: &str = r#"1. To find who played a game:
MATCH (u:User)-[p:PLAYED]->(g:Game {title: "Stardew Valley"})
RETURN u.username, p.total_playtime, p.days_per_week

2. To find games with a specific tag:
MATCH (g:Game)-[:HAS_TAG]->(t:Tag {name: "RPG"})
RETURN g.title, g.app_id

3. To get games a user's friends have played:
MATCH (u:User {username: "gamer123"})-[:FRIENDS_WITH]-(f:User)-[:PLAYED]->(g:Game)
RETURN g.title, count(*) AS times_played
ORDER BY times_played DESC

4. Get all games supported on a specific platform:
MATCH (g:Game)-[:SUPPORTS]->(p:Platform {name: "Windows"})
RETURN g.title, g.app_id, g.price

5. Retrieve top games played by a specific user (by total playtime):
MATCH (u:User {username: "pixelninja"})-[p:PLAYED]->(g:Game)
RETURN g.title, p.total_playtime
ORDER BY p.total_playtime DESC
LIMIT 5

6. Find games that are both RPG and Multiplayer:
MATCH (g:Game)-[:HAS_TAG]->(t1:Tag {name: "RPG"})
MATCH (g)-[:HAS_TAG]->(t2:Tag {name: "Multiplayer"})
RETURN g.title, g.app_id

7. Get games released after 2020:
MATCH (g:Game)
WHERE date(g.release_date) > date("2020-01-01")
RETURN g.title, g.release_date

8. Find which of my friends played a specific game:
MATCH (me:User {username: "gamer123"})-[:FRIENDS_WITH]->(f:User)-[:PLAYED]->(g:Game {title: "Cyberpunk 2077"})
RETURN f.username, g.title

9. Get top 10 most recommended games:
MATCH (g:Game)
RETURN g.title, g.recommendation_count
ORDER BY g.recommendation_count DESC
LIMIT 10

10. Find games that users have recommended via reviews:
MATCH (u:User)-[:WROTE_REVIEW]->(r:Review {is_recommended: true})-[:REVIEWS]->(g:Game)
RETURN g.title, count(*) AS recommendation_count
ORDER BY recommendation_count DESC

11. List games played in the last 30 days:
MATCH (u:User)-[p:PLAYED]->(g:Game)
WHERE p.last_played_date >= date() - duration({days: 30})
RETURN DISTINCT g.title, p.last_played_date

12. Average number of days per week a specific game is played:
MATCH (u:User)-[p:PLAYED]->(g:Game {title: "Elden Ring"})
RETURN avg(p.days_per_week) AS avg_days_per_week

13. Tags and platforms for a specific game:
MATCH (g:Game {title: "Hades"})
OPTIONAL MATCH (g)-[:HAS_TAG]->(t:Tag)
OPTIONAL MATCH (g)-[:SUPPORTS]->(p:Platform)
RETURN g.title, collect(DISTINCT t.name) AS tags, collect(DISTINCT p.name) AS platforms

14. Find friends for a specific user:
MATCH (u:User {username: "cooldragon_4617"})-[:FRIENDS_WITH]-(f:User)
RETURN f.username"#;

/// Generates the query-generation template for a schema
///
/// The returned template still contains the `{question}` placeholder.
///
/// # Examples
///
/// ```
/// use nextlevelbot::graph::GraphSchema;
/// use nextlevelbot::prompts::cypher_prompt::generate_cypher_template;
///
/// let template = generate_cypher_template(&GraphSchema::games().describe());
/// assert!(template.contains("{question}"));
/// assert!(template.contains("Witcher 3, The"));
/// ```
pub fn generate_cypher_template(schema: &str) -> String {
    format!(
        r#"Task: Generate a Cypher query based on the user's question.
Instructions:
- Use ONLY the provided schema
- Output ONLY the executable Cypher query
- Never include explanations, markdown, or natural language
- Start directly with Cypher keywords (MATCH, RETURN, etc.)
You are an expert Neo4j developer translating user questions into Cypher to answer questions about video games and generate personalized recommendations.

Use only the node labels, relationship types and properties explicitly listed in the schema.
Do not invent or assume any other relationship types or properties.
Never write to the database: no CREATE, MERGE, DELETE, SET, REMOVE or DROP.
Do not return entire nodes or any embedding-related properties.
Do not return the full Description text unless the user specifically asks for it.

Fine-tuning:
- If a game title starts with "The", move "The" to the end for matching purposes.
  For example, "The Witcher 3" becomes "Witcher 3, The".

Example Cypher statements:

{examples}

Schema:
{schema}
Question:
{{question}}
"#,
        examples = EXAMPLES
    )
}
